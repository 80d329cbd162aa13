#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::ProbeSettings;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 聚合器的錯誤處理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// false 時第一個型別化錯誤即終止本次執行
    pub ignore_errors: bool,
    /// 只有在 ignore_errors 為 true 時才有意義
    pub yield_errors: bool,
}

impl ErrorPolicy {
    pub fn new(ignore_errors: bool, yield_errors: bool) -> Self {
        Self {
            ignore_errors,
            yield_errors: ignore_errors && yield_errors,
        }
    }

    pub fn strict() -> Self {
        Self::new(false, false)
    }
}
