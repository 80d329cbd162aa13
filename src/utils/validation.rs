use crate::utils::error::{CheckError, Result};
use std::fmt::Display;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn rejected(field: &str, value: impl Display, reason: impl Into<String>) -> CheckError {
    CheckError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 連線檢查用的網址：只接受 http / https
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(rejected(field, raw, "URL cannot be empty"));
    }
    let url = Url::parse(raw).map_err(|e| rejected(field, raw, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(rejected(field, raw, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(rejected(field, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(rejected(field, path.escape_debug(), "Path contains null bytes"));
    }
    Ok(())
}

/// 秒數類設定不可為 0
pub fn validate_positive_number(field: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(rejected(field, value, format!("Value must be at least {}", min_value)));
    }
    Ok(())
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(rejected(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(rejected(field, value, format!("Value must be between {} and {}", min, max)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("connectivity_url", "https://example.com").is_ok());
        assert!(validate_url("connectivity_url", "http://www.google.com/").is_ok());
        assert!(validate_url("connectivity_url", "").is_err());
        assert!(validate_url("connectivity_url", "invalid-url").is_err());
        assert!(validate_url("connectivity_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("file", "hosts.csv").is_ok());
        assert!(validate_path("file", "").is_err());
        assert!(validate_path("file", "hosts\0.csv").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("interval_secs", 60, 1).is_ok());
        assert!(validate_positive_number("interval_secs", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range_reports_field() {
        assert!(validate_range("latency_penalty_ms", 5000.0, 1.0, 60_000.0).is_ok());
        let err = validate_range("offline_max_attempts", 0u32, 1, 100).unwrap_err();
        assert!(matches!(
            err,
            CheckError::InvalidConfigValueError { ref field, ref value, .. }
                if field == "offline_max_attempts" && value == "0"
        ));
    }
}
