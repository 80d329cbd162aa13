use crate::config::ProbeSettings;
use crate::core::guard::{ConnectivityGuard, Guarded};
use crate::domain::model::{HostResult, PortResult, ProbeResult, Record, IP_DISPLAY_MARKER};
use crate::domain::ports::NetworkProbe;
use crate::utils::error::{CheckError, Rejection, Result};
use regex::Regex;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::OnceLock;

pub const HTTPS_PORT: u16 = 443;
pub const HTTP_PORT: u16 = 80;
/// URL 錯誤時的慣例狀態碼
pub const URL_ERROR_STATUS: u16 = 403;

const IPV4_PATTERN: &str = r"^(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IPV4_PATTERN).expect("IPv4 pattern is valid"))
}

/// 主機分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// 非迴路的 IPv4 位址
    Address(Ipv4Addr),
    /// `127.0.0.1` (literal) 或 `localhost`
    Loopback { literal: bool },
    Hostname,
}

impl HostKind {
    pub fn is_ip(&self) -> bool {
        matches!(self, HostKind::Address(_) | HostKind::Loopback { literal: true })
    }

    pub fn is_loopback(&self) -> bool {
        matches!(self, HostKind::Loopback { .. })
    }
}

/// 單筆記錄的探測階段，依序執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    ClassifyHost,
    ResolveOrVerify,
    GatePorts,
    FetchStatus,
    Aggregate,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeStage::ClassifyHost => "classify-host",
            ProbeStage::ResolveOrVerify => "resolve-or-verify",
            ProbeStage::GatePorts => "gate-ports",
            ProbeStage::FetchStatus => "fetch-status",
            ProbeStage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

pub fn classify_host(host: &str) -> HostKind {
    if host == "localhost" {
        return HostKind::Loopback { literal: false };
    }
    if !ipv4_regex().is_match(host) {
        return HostKind::Hostname;
    }
    match host.parse::<Ipv4Addr>() {
        Ok(ip) if ip == Ipv4Addr::LOCALHOST => HostKind::Loopback { literal: true },
        Ok(ip) => HostKind::Address(ip),
        // 前導零 (例如 010.0.0.1) 符合樣式但無法解析
        Err(_) => HostKind::Hostname,
    }
}

/// 沒有 scheme 時補上 `http://`
pub fn normalize_url(target: &str) -> String {
    if target.contains("http://") || target.contains("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

pub struct ProbeEngine<N: NetworkProbe> {
    network: N,
    guard: ConnectivityGuard,
    latency_penalty_ms: f64,
}

impl<N: NetworkProbe> ProbeEngine<N> {
    pub fn new(network: N, settings: &ProbeSettings) -> Self {
        Self {
            network,
            guard: ConnectivityGuard::from_settings(settings),
            latency_penalty_ms: settings.latency_penalty_ms,
        }
    }

    pub fn with_guard(network: N, guard: ConnectivityGuard, latency_penalty_ms: f64) -> Self {
        Self {
            network,
            guard,
            latency_penalty_ms,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// 探測單筆記錄。主機為空時不產生結果；
    /// 任何關卡失敗都以型別化錯誤回傳。
    pub async fn probe(&self, record: &Record) -> Result<Vec<ProbeResult>> {
        let Some(host) = record.host.as_deref() else {
            return Ok(Vec::new());
        };

        let kind = classify_host(host);
        tracing::debug!("[{}] {} -> {:?}", ProbeStage::ClassifyHost, host, kind);

        self.verify(host, kind, record.ports.is_some()).await?;
        self.collect(host, kind, record.ports.as_deref()).await
    }

    async fn verify(&self, host: &str, kind: HostKind, ports_requested: bool) -> Result<()> {
        tracing::debug!("[{}] {}", ProbeStage::ResolveOrVerify, host);
        match kind {
            HostKind::Address(ip) => {
                if !self.reachable(host).await? {
                    return Err(Rejection::NotReachable { target: ip.to_string() }.into());
                }
                if self.reverse_lookup(IpAddr::V4(ip)).await?.is_none() {
                    return Err(Rejection::NoHostName { ip: ip.to_string() }.into());
                }
                self.gate_ports(host).await?;
            }
            HostKind::Loopback { .. } | HostKind::Hostname => {
                if self.resolve(host).await?.is_none() {
                    return Err(Rejection::NoAddress { host: host.to_string() }.into());
                }
                if !kind.is_loopback() {
                    if ports_requested {
                        self.gate_ports(host).await?;
                    }
                    if !self.reachable(host).await? {
                        return Err(Rejection::NotReachable { target: host.to_string() }.into());
                    }
                }
            }
        }

        let status = self.status_code(host).await?;
        tracing::debug!("[{}] {} -> {}", ProbeStage::FetchStatus, host, status);
        if status / 100 == 5 {
            return Err(Rejection::ServerError { status }.into());
        }
        Ok(())
    }

    async fn gate_ports(&self, target: &str) -> Result<()> {
        tracing::debug!("[{}] {} ports {}/{}", ProbeStage::GatePorts, target, HTTPS_PORT, HTTP_PORT);
        if !self.port_open(target, HTTPS_PORT).await? || !self.port_open(target, HTTP_PORT).await? {
            return Err(Rejection::PortsClosed { target: target.to_string() }.into());
        }
        Ok(())
    }

    async fn collect(&self, host: &str, kind: HostKind, ports: Option<&[u16]>) -> Result<Vec<ProbeResult>> {
        tracing::debug!("[{}] {}", ProbeStage::Aggregate, host);
        let display_name = if kind.is_ip() {
            IP_DISPLAY_MARKER.to_string()
        } else {
            host.to_string()
        };

        let addresses = match kind {
            HostKind::Address(ip) => vec![IpAddr::V4(ip)],
            HostKind::Loopback { literal: true } => vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            _ => self
                .resolve(host)
                .await?
                .ok_or_else(|| CheckError::from(Rejection::NoAddress { host: host.to_string() }))?,
        };
        let multiple_ips = addresses.len() > 1;

        let mut results = Vec::new();
        match ports {
            Some([]) if kind.is_loopback() => {
                let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
                results.push(ProbeResult::Host(HostResult {
                    display_name,
                    ip,
                    rtt_ms: self.rtt_ms(ip).await,
                    multiple_ips,
                }));
            }
            None | Some([]) => {
                for ip in addresses {
                    results.push(ProbeResult::Host(HostResult {
                        display_name: display_name.clone(),
                        ip,
                        rtt_ms: self.rtt_ms(ip).await,
                        multiple_ips,
                    }));
                }
            }
            Some(ports) => {
                for ip in addresses {
                    let rtt_ms = self.rtt_ms(ip).await;
                    let target = ip.to_string();
                    for &port in ports {
                        results.push(ProbeResult::Port(PortResult {
                            display_name: display_name.clone(),
                            ip,
                            rtt_ms,
                            port,
                            port_open: self.port_open(&target, port).await?,
                            multiple_ips,
                        }));
                    }
                }
            }
        }
        Ok(results)
    }

    async fn rtt_ms(&self, ip: IpAddr) -> f64 {
        match self.network.latency(ip).await {
            Some(rtt) => rtt.as_secs_f64() * 1000.0,
            None => {
                tracing::debug!("No echo reply from {}, using {} ms", ip, self.latency_penalty_ms);
                self.latency_penalty_ms
            }
        }
    }

    async fn reachable(&self, target: &str) -> Result<bool> {
        let url = normalize_url(target);
        online(
            self.guard
                .reachability(&self.network, || self.network.http_reachable(&url))
                .await,
        )
        .map(|reachable| reachable.unwrap_or(false))
    }

    async fn status_code(&self, target: &str) -> Result<u16> {
        let url = normalize_url(target);
        online(
            self.guard
                .call(&self.network, || self.network.status_code(&url))
                .await,
        )
        .map(|status| status.unwrap_or(URL_ERROR_STATUS))
    }

    async fn port_open(&self, target: &str, port: u16) -> Result<bool> {
        online(
            self.guard
                .call(&self.network, || self.network.port_open(target, port))
                .await,
        )
        .map(|open| open.unwrap_or(false))
    }

    /// 只保留 IPv4 位址並去除重複；沒有可用位址時回傳 None
    async fn resolve(&self, host: &str) -> Result<Option<Vec<IpAddr>>> {
        let resolved = online(
            self.guard
                .call(&self.network, || self.network.resolve(host))
                .await,
        )?
        .flatten();

        Ok(resolved.and_then(|ips| {
            let mut unique: Vec<IpAddr> = Vec::new();
            for ip in ips.into_iter().filter(IpAddr::is_ipv4) {
                if !unique.contains(&ip) {
                    unique.push(ip);
                }
            }
            (!unique.is_empty()).then_some(unique)
        }))
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Option<String>> {
        online(
            self.guard
                .call(&self.network, || self.network.reverse_lookup(ip))
                .await,
        )
        .map(Option::flatten)
    }
}

/// `ConnectionDown` 轉成 `NoInternetConnection`；傳輸錯誤交給呼叫端決定預設值
fn online<T>(guarded: Guarded<T>) -> Result<Option<T>> {
    match guarded {
        Guarded::Ok(value) => Ok(Some(value)),
        Guarded::TransportError(_) => Ok(None),
        Guarded::ConnectionDown => Err(CheckError::NoInternetConnection),
    }
}
