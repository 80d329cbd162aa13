use crate::config::{ErrorPolicy, LogFormat};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sitecheck")]
#[command(about = "Periodic reachability checks for hosts listed in a Host;Ports table")]
pub struct CliConfig {
    /// Path to the `;` separated table (asked interactively when omitted)
    #[arg(short, long)]
    pub file: Option<String>,

    /// Keep going after invalid rows and failed checks
    #[arg(long)]
    pub ignore_errors: Option<bool>,

    /// Report ignored errors instead of skipping them silently
    #[arg(long)]
    pub yield_errors: Option<bool>,

    #[arg(long, default_value = "3600")]
    pub interval_secs: u64,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// TOML file with a [probe] section overriding timeouts
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 命令列旗標都有提供時直接組成策略，否則交給互動提示補齊
    pub fn error_policy(&self) -> Option<ErrorPolicy> {
        match (self.ignore_errors, self.yield_errors) {
            (Some(false), _) => Some(ErrorPolicy::strict()),
            (Some(true), Some(yield_errors)) => Some(ErrorPolicy::new(true, yield_errors)),
            _ => None,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            validate_path("file", file)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        validate_positive_number("interval_secs", self.interval_secs, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let config = CliConfig::parse_from([
            "sitecheck",
            "--file",
            "hosts.csv",
            "--ignore-errors",
            "true",
            "--yield-errors",
            "false",
            "--once",
        ]);

        assert_eq!(config.file.as_deref(), Some("hosts.csv"));
        assert_eq!(config.error_policy(), Some(ErrorPolicy::new(true, false)));
        assert!(config.once);
        assert_eq!(config.interval_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_needs_prompt_when_flags_missing() {
        let config = CliConfig::parse_from(["sitecheck", "--ignore-errors", "true"]);
        assert_eq!(config.error_policy(), None);

        let config = CliConfig::parse_from(["sitecheck", "--ignore-errors", "false"]);
        assert_eq!(config.error_policy(), Some(ErrorPolicy::strict()));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = CliConfig::parse_from(["sitecheck", "--interval-secs", "0"]);
        assert!(config.validate().is_err());
    }
}
