use crate::config::ErrorPolicy;
use crate::domain::model::{Outcome, ProbeResult};
use crate::utils::error::{CheckError, Result};

/// 聚合器處理一個事件後，本次執行是否繼續
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// 依 `ErrorPolicy` 將驗證錯誤、探測結果與探測錯誤攤平成輸出序列
#[derive(Debug)]
pub struct Aggregator {
    policy: ErrorPolicy,
    outcomes: Vec<Outcome>,
    halted: bool,
}

impl Aggregator {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            outcomes: Vec::new(),
            halted: false,
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn push_results(&mut self, results: Vec<ProbeResult>) -> Flow {
        if self.halted {
            return Flow::Halt;
        }
        self.outcomes
            .extend(results.into_iter().map(Outcome::Success));
        Flow::Continue
    }

    pub fn push_error(&mut self, err: CheckError) -> Flow {
        if self.halted {
            return Flow::Halt;
        }

        match err {
            // 本機斷線不屬於目標錯誤，一律回報且不中斷
            CheckError::NoInternetConnection => {
                self.outcomes.push(Outcome::Failure(err));
                Flow::Continue
            }
            err if err.is_fatal() || !self.policy.ignore_errors => {
                self.outcomes.push(Outcome::Failure(err));
                self.halted = true;
                Flow::Halt
            }
            err => {
                if self.policy.yield_errors {
                    self.outcomes.push(Outcome::Failure(err));
                } else {
                    tracing::debug!("Ignoring error: {}", err);
                }
                Flow::Continue
            }
        }
    }

    pub fn push(&mut self, outcome: Result<Vec<ProbeResult>>) -> Flow {
        match outcome {
            Ok(results) => self.push_results(results),
            Err(err) => self.push_error(err),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn finish(self) -> (Vec<Outcome>, bool) {
        (self.outcomes, self.halted)
    }
}
