use crate::config::ErrorPolicy;
use crate::core::aggregator::{Aggregator, Flow};
use crate::core::probe::ProbeEngine;
use crate::core::source::{SourceEntry, SourceTable};
use crate::domain::model::Outcome;
use crate::domain::ports::NetworkProbe;
use crate::utils::error::CheckError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 一次完整檢查的結果
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub outcomes: Vec<Outcome>,
    pub probed: usize,
    pub halted: bool,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &CheckError> {
        self.outcomes.iter().filter_map(Outcome::as_error)
    }

    /// 需要結束整個程序的錯誤：檔案層級錯誤，或嚴格模式下的資料列錯誤。
    /// 目標本身的錯誤只結束本次執行。
    pub fn terminal_error(&self) -> Option<&CheckError> {
        if !self.halted {
            return None;
        }
        self.errors().last().filter(|err| {
            err.is_fatal() || matches!(err, CheckError::DataInvalidFormat { .. })
        })
    }
}

/// 對單一來源檔案執行檢查；每次執行都重新讀取檔案
pub struct SiteChecker<N: NetworkProbe> {
    path: PathBuf,
    policy: ErrorPolicy,
    engine: ProbeEngine<N>,
}

impl<N: NetworkProbe> SiteChecker<N> {
    pub fn new(path: impl Into<PathBuf>, policy: ErrorPolicy, engine: ProbeEngine<N>) -> Self {
        Self {
            path: path.into(),
            policy,
            engine,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn engine(&self) -> &ProbeEngine<N> {
        &self.engine
    }

    pub async fn run_once(&self) -> RunReport {
        let started_at = Local::now();
        let timer = Instant::now();
        tracing::info!("🔍 Check starting for {}", self.path.display());

        let mut aggregator = Aggregator::new(self.policy);
        let mut probed = 0;

        match SourceTable::load(&self.path) {
            Err(err) => {
                aggregator.push_error(err);
            }
            // 嚴格模式下先檢查表格狀態，有列錯誤就不探測任何記錄
            Ok(table) if !self.policy.ignore_errors && table.status().is_some() => {
                if let Some(err) = table.into_status() {
                    tracing::debug!("Invalid rows found, skipping probes: {}", err);
                    aggregator.push_error(err);
                }
            }
            Ok(table) => {
                for entry in table.into_entries() {
                    let flow = match entry {
                        SourceEntry::Invalid(err) => aggregator.push_error(err),
                        SourceEntry::Record(record) if record.host.is_none() => Flow::Continue,
                        SourceEntry::Record(record) => {
                            probed += 1;
                            tracing::debug!("Probing line {}: {:?}", record.line, record.host);
                            aggregator.push(self.engine.probe(&record).await)
                        }
                    };
                    if flow == Flow::Halt {
                        tracing::debug!("Run halted by error policy");
                        break;
                    }
                }
            }
        }

        let (outcomes, halted) = aggregator.finish();
        let report = RunReport {
            started_at,
            elapsed: timer.elapsed(),
            outcomes,
            probed,
            halted,
        };
        tracing::info!(
            "✅ Check completed: {} records probed, {} results, {} errors reported in {:?}",
            report.probed,
            report.successes(),
            report.errors().count(),
            report.elapsed
        );
        report
    }
}
