use std::fmt;
use thiserror::Error;

/// 來源檔案層級錯誤的種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    FileMissing,
    WrongExtension,
    SchemaError,
}

/// 探測關卡失敗的原因，帶有出問題的值
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("ip is not success ({target})")]
    NotReachable { target: String },

    #[error("can't get host name by address ({ip})")]
    NoHostName { ip: String },

    #[error("HTTPS or HTTP ports closed ({target})")]
    PortsClosed { target: String },

    #[error("can't get ip from the host ({host})")]
    NoAddress { host: String },

    #[error("server error ({status})")]
    ServerError { status: u16 },
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{message}")]
    FileInvalidFormat { kind: FileErrorKind, message: String },

    #[error("{message} (line {line})")]
    DataInvalidFormat { line: usize, message: String },

    #[error("{0}")]
    Checker(#[from] Rejection),

    #[error("No internet connection! (NoInternetConnection)")]
    NoInternetConnection,

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Data,
    Probe,
    Connectivity,
    Configuration,
    System,
}

impl CheckError {
    pub fn file(kind: FileErrorKind, message: impl Into<String>) -> Self {
        Self::FileInvalidFormat {
            kind,
            message: message.into(),
        }
    }

    pub fn data(line: usize, message: impl Into<String>) -> Self {
        Self::DataInvalidFormat {
            line,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CheckError::Checker(_) | CheckError::NoInternetConnection => ErrorSeverity::Low,
            CheckError::HttpClientError(_) => ErrorSeverity::Medium,
            CheckError::DataInvalidFormat { .. }
            | CheckError::ConfigError { .. }
            | CheckError::InvalidConfigValueError { .. }
            | CheckError::MissingConfigError { .. } => ErrorSeverity::High,
            CheckError::FileInvalidFormat { .. }
            | CheckError::CsvError(_)
            | CheckError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckError::FileInvalidFormat { .. } | CheckError::CsvError(_) => ErrorCategory::Source,
            CheckError::DataInvalidFormat { .. } => ErrorCategory::Data,
            CheckError::Checker(_) => ErrorCategory::Probe,
            CheckError::NoInternetConnection | CheckError::HttpClientError(_) => {
                ErrorCategory::Connectivity
            }
            CheckError::ConfigError { .. }
            | CheckError::InvalidConfigValueError { .. }
            | CheckError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CheckError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 是否為會中止整個來源檔案處理的錯誤
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckError::FileInvalidFormat { .. } | CheckError::CsvError(_) | CheckError::IoError(_)
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckError::FileInvalidFormat { .. } => format!("Cannot use the input table: {}", self),
            CheckError::DataInvalidFormat { .. } => format!("Invalid row in the input table: {}", self),
            CheckError::Checker(rejection) => format!("Endpoint check failed: {}", rejection),
            CheckError::NoInternetConnection => {
                "The local machine has no internet connection".to_string()
            }
            CheckError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Source => {
                "Check that the file exists, ends with .csv and has the header \"Host;Ports\""
            }
            ErrorCategory::Data => {
                "Fix the row (ports must be comma separated integers, host must not be empty) or run with --ignore-errors"
            }
            ErrorCategory::Probe => "Verify the endpoint is up and serving HTTP on ports 80 and 443",
            ErrorCategory::Connectivity => "Check the local network connection and try again",
            ErrorCategory::Configuration => "Review the command line flags and the TOML settings file",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;

/// 網路轉接層的傳輸錯誤，由連線守衛轉成型別化結果
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("operation timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("name resolution failed: {0}")]
    Resolve(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileErrorKind::FileMissing => "file missing",
            FileErrorKind::WrongExtension => "wrong extension",
            FileErrorKind::SchemaError => "schema error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages_carry_offending_value() {
        let err = CheckError::from(Rejection::ServerError { status: 503 });
        assert_eq!(err.to_string(), "server error (503)");

        let err = CheckError::from(Rejection::PortsClosed {
            target: "10.0.0.1".to_string(),
        });
        assert_eq!(err.to_string(), "HTTPS or HTTP ports closed (10.0.0.1)");
    }

    #[test]
    fn test_severity_follows_taxonomy() {
        let file = CheckError::file(FileErrorKind::SchemaError, "bad header");
        let data = CheckError::data(3, "host must be not None");
        let probe = CheckError::from(Rejection::NoAddress {
            host: "nowhere.invalid".to_string(),
        });

        assert_eq!(file.severity(), ErrorSeverity::Critical);
        assert!(file.is_fatal());
        assert_eq!(data.severity(), ErrorSeverity::High);
        assert!(!data.is_fatal());
        assert_eq!(probe.severity(), ErrorSeverity::Low);
        assert_eq!(probe.category(), ErrorCategory::Probe);
        assert_eq!(data.to_string(), "host must be not None (line 3)");
    }
}
