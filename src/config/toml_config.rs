use crate::utils::error::{CheckError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONNECTIVITY_URL: &str = "http://www.google.com/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    pub probe: Option<ProbeSettings>,
}

/// 探測逾時與連線守衛的設定，所有欄位皆有預設值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub connectivity_url: String,
    pub connectivity_timeout_secs: u64,
    pub offline_pause_secs: u64,
    pub offline_max_attempts: u32,
    pub connectivity_cache_secs: u64,
    pub reachability_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub port_timeout_secs: u64,
    pub latency_timeout_secs: u64,
    pub latency_penalty_ms: f64,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connectivity_url: DEFAULT_CONNECTIVITY_URL.to_string(),
            connectivity_timeout_secs: 3,
            offline_pause_secs: 3,
            offline_max_attempts: 5,
            connectivity_cache_secs: 0,
            reachability_timeout_secs: 10,
            status_timeout_secs: 5,
            port_timeout_secs: 10,
            latency_timeout_secs: 5,
            latency_penalty_ms: 5000.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProbeSettings {
    /// 從 TOML 檔案載入設定（讀取 `[probe]` 區段）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CheckError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let file: SettingsFile =
            toml::from_str(&processed_content).map_err(|e| CheckError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(file.probe.unwrap_or_default())
    }

    /// 替換環境變數 (例如 ${CONNECTIVITY_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CheckError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }

    pub fn offline_pause(&self) -> Duration {
        Duration::from_secs(self.offline_pause_secs)
    }

    pub fn connectivity_cache(&self) -> Duration {
        Duration::from_secs(self.connectivity_cache_secs)
    }

    pub fn reachability_timeout(&self) -> Duration {
        Duration::from_secs(self.reachability_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn port_timeout(&self) -> Duration {
        Duration::from_secs(self.port_timeout_secs)
    }

    pub fn latency_timeout(&self) -> Duration {
        Duration::from_secs(self.latency_timeout_secs)
    }
}

impl Validate for ProbeSettings {
    fn validate(&self) -> Result<()> {
        validate_url("probe.connectivity_url", &self.connectivity_url)?;
        validate_non_empty_string("probe.user_agent", &self.user_agent)?;

        for (field, value) in [
            ("probe.connectivity_timeout_secs", self.connectivity_timeout_secs),
            ("probe.reachability_timeout_secs", self.reachability_timeout_secs),
            ("probe.status_timeout_secs", self.status_timeout_secs),
            ("probe.port_timeout_secs", self.port_timeout_secs),
            ("probe.latency_timeout_secs", self.latency_timeout_secs),
        ] {
            validate_positive_number(field, value, 1)?;
        }

        validate_range("probe.offline_max_attempts", self.offline_max_attempts, 1, 100)?;
        validate_range("probe.latency_penalty_ms", self.latency_penalty_ms, 1.0, 600_000.0)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_probe_settings() {
        let toml_content = r#"
[probe]
offline_max_attempts = 2
port_timeout_secs = 4
"#;

        let settings = ProbeSettings::from_toml_str(toml_content).unwrap();

        assert_eq!(settings.offline_max_attempts, 2);
        assert_eq!(settings.port_timeout(), Duration::from_secs(4));
        assert_eq!(settings.connectivity_url, DEFAULT_CONNECTIVITY_URL);
        assert_eq!(settings.latency_penalty_ms, 5000.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_probe_section_uses_defaults() {
        let settings = ProbeSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ProbeSettings::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SITECHECK_TEST_CONNECTIVITY_URL", "https://connectivity.example.com/");

        let toml_content = r#"
[probe]
connectivity_url = "${SITECHECK_TEST_CONNECTIVITY_URL}"
"#;

        let settings = ProbeSettings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.connectivity_url, "https://connectivity.example.com/");

        std::env::remove_var("SITECHECK_TEST_CONNECTIVITY_URL");
    }

    #[test]
    fn test_settings_validation() {
        let toml_content = r#"
[probe]
connectivity_url = "invalid-url"
"#;

        let settings = ProbeSettings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());

        let settings = ProbeSettings {
            offline_max_attempts: 0,
            ..ProbeSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[probe]\nlatency_penalty_ms = 2500.0\n")
            .unwrap();

        let settings = ProbeSettings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.latency_penalty_ms, 2500.0);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ProbeSettings::from_toml_str("[probe\n").unwrap_err();
        assert!(matches!(err, CheckError::ConfigError { .. }));
    }
}
