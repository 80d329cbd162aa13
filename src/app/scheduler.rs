use crate::app::report;
use crate::config::LogFormat;
use crate::core::checker::{RunReport, SiteChecker};
use crate::domain::ports::NetworkProbe;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// 排程結束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEnd {
    Interrupted,
    /// 出現需要結束程序的錯誤，附帶結束碼
    Terminated(i32),
}

pub fn exit_code(report: &RunReport) -> i32 {
    if report.terminal_error().is_some() {
        1
    } else {
        0
    }
}

/// 執行一次並輸出結果
pub async fn run_and_report<N: NetworkProbe>(checker: &SiteChecker<N>, format: LogFormat) -> RunReport {
    let report = checker.run_once().await;
    report::emit_report(&report, format);
    report
}

/// 啟動時立即執行一次，之後每隔 `every` 執行；Ctrl-C 結束
pub async fn run_every<N: NetworkProbe>(
    checker: &SiteChecker<N>,
    every: Duration,
    format: LogFormat,
) -> ScheduleEnd {
    run_until(checker, every, format, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl-C, stopping scheduler");
    })
    .await
}

/// 與 `run_every` 相同，但由 `shutdown` 決定何時停止；
/// 執行中途收到停止訊號時會放棄該次執行
pub async fn run_until<N, F>(
    checker: &SiteChecker<N>,
    every: Duration,
    format: LogFormat,
    shutdown: F,
) -> ScheduleEnd
where
    N: NetworkProbe,
    F: Future<Output = ()>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => return ScheduleEnd::Interrupted,
        }

        let report = tokio::select! {
            report = run_and_report(checker, format) => report,
            _ = &mut shutdown => {
                tracing::warn!("⚠️ Check interrupted before completion");
                return ScheduleEnd::Interrupted;
            }
        };

        if let Some(err) = report.terminal_error() {
            tracing::error!("❌ {}", err.user_friendly_message());
            tracing::error!("💡 Suggestion: {}", err.recovery_suggestion());
            return ScheduleEnd::Terminated(exit_code(&report));
        }
        tracing::info!("⏰ Next check in {:?}", every);
    }
}
