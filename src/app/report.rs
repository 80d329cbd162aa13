use crate::config::LogFormat;
use crate::core::checker::RunReport;
use crate::domain::model::{Outcome, OutcomeLevel};
use serde_json::json;

fn level_name(level: OutcomeLevel) -> &'static str {
    match level {
        OutcomeLevel::Info => "info",
        OutcomeLevel::Warning => "warning",
        OutcomeLevel::Error => "error",
        OutcomeLevel::Critical => "critical",
    }
}

/// 結果轉成一行 JSON，成功與錯誤共用 `level` 欄位
pub fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    let level = level_name(outcome.level());
    match outcome {
        Outcome::Success(result) => json!({
            "level": level,
            "result": result,
        }),
        Outcome::Failure(err) => json!({
            "level": level,
            "category": format!("{:?}", err.category()),
            "error": err.to_string(),
        }),
    }
}

pub fn emit_outcome(outcome: &Outcome, format: LogFormat) {
    if format == LogFormat::Json {
        println!("{}", outcome_json(outcome));
        return;
    }

    match outcome.level() {
        OutcomeLevel::Info => tracing::info!("{}", outcome),
        OutcomeLevel::Warning => tracing::warn!("{}", outcome),
        OutcomeLevel::Error => tracing::error!("{}", outcome),
        OutcomeLevel::Critical => tracing::error!("🛑 CRITICAL: {}", outcome),
    }
}

pub fn emit_report(report: &RunReport, format: LogFormat) {
    for outcome in &report.outcomes {
        emit_outcome(outcome, format);
    }
}
