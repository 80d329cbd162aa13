use crate::utils::error::{CheckError, ErrorSeverity};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// 輸入主機本身是 IP 時使用的顯示名稱
pub const IP_DISPLAY_MARKER: &str = "???";

/// 來源表格中的一列：主機與可選的埠號清單
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub line: usize,
    pub host: Option<String>,
    pub ports: Option<Vec<u16>>,
}

impl Record {
    pub fn new(line: usize, host: Option<String>, ports: Option<Vec<u16>>) -> Self {
        Self { line, host, ports }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostResult {
    pub display_name: String,
    pub ip: IpAddr,
    pub rtt_ms: f64,
    pub multiple_ips: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortResult {
    pub display_name: String,
    pub ip: IpAddr,
    pub rtt_ms: f64,
    pub port: u16,
    pub port_open: bool,
    pub multiple_ips: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeResult {
    Host(HostResult),
    Port(PortResult),
}

impl ProbeResult {
    pub fn display_name(&self) -> &str {
        match self {
            ProbeResult::Host(r) => &r.display_name,
            ProbeResult::Port(r) => &r.display_name,
        }
    }

    pub fn ip(&self) -> IpAddr {
        match self {
            ProbeResult::Host(r) => r.ip,
            ProbeResult::Port(r) => r.ip,
        }
    }
}

impl fmt::Display for HostResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host: {}\t|\tip: {}\t|\tRTT: {:.3} ms\t|\tport: ???\t|\tmulti ip: {}",
            self.display_name, self.ip, self.rtt_ms, self.multiple_ips
        )
    }
}

impl fmt::Display for PortResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host: {}\t|\tip: {}\t|\tRTT: {:.3} ms\t|\tport: {}\t|\tstatus: {}\t|\tmulti ip: {}",
            self.display_name,
            self.ip,
            self.rtt_ms,
            self.port,
            if self.port_open { "Opened" } else { "Not opened" },
            self.multiple_ips
        )
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::Host(r) => r.fmt(f),
            ProbeResult::Port(r) => r.fmt(f),
        }
    }
}

/// 聚合器輸出給顯示層的單一結果
#[derive(Debug)]
pub enum Outcome {
    Success(ProbeResult),
    Failure(CheckError),
}

/// 顯示層使用的等級對應
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl Outcome {
    pub fn level(&self) -> OutcomeLevel {
        match self {
            Outcome::Success(_) => OutcomeLevel::Info,
            Outcome::Failure(err) => match err {
                CheckError::FileInvalidFormat { .. } => OutcomeLevel::Critical,
                CheckError::DataInvalidFormat { .. } => OutcomeLevel::Error,
                CheckError::Checker(_) | CheckError::NoInternetConnection => OutcomeLevel::Warning,
                other if other.severity() == ErrorSeverity::Critical => OutcomeLevel::Critical,
                _ => OutcomeLevel::Error,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn as_error(&self) -> Option<&CheckError> {
        match self {
            Outcome::Failure(err) => Some(err),
            Outcome::Success(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(result) => result.fmt(f),
            Outcome::Failure(err) => err.fmt(f),
        }
    }
}
