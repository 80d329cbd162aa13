use crate::adapters::hosts::HostsFile;
use crate::config::ProbeSettings;
use crate::domain::ports::{NetworkProbe, TransportResult};
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Config as PingConfig, PingIdentifier, PingSequence, ICMP};
use tokio::net::TcpStream;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

const PING_PAYLOAD: [u8; 56] = [0; 56];
/// 正向解析時使用的埠號，只影響 getaddrinfo 的提示
const RESOLVE_PORT: u16 = 80;

/// 使用系統網路堆疊的實作：reqwest、tokio TCP、系統 DNS 與 ICMP echo
pub struct SystemNetwork {
    connectivity_client: Client,
    reach_client: Client,
    status_client: Client,
    connectivity_url: String,
    port_timeout: Duration,
    latency_timeout: Duration,
    resolver: TokioAsyncResolver,
    hosts: HostsFile,
    // ICMP 用戶端在第一次量測時建立，之後重複使用；建立失敗記為 None
    ping_v4: OnceCell<Option<surge_ping::Client>>,
    ping_v6: OnceCell<Option<surge_ping::Client>>,
}

impl SystemNetwork {
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let connectivity_client = Client::builder()
            .timeout(settings.connectivity_timeout())
            .build()?;
        let reach_client = Client::builder()
            .timeout(settings.reachability_timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        let status_client = Client::builder()
            .timeout(settings.status_timeout())
            .build()?;

        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!("⚠️ Cannot read system resolver config ({}), using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });

        Ok(Self {
            connectivity_client,
            reach_client,
            status_client,
            connectivity_url: settings.connectivity_url.clone(),
            port_timeout: settings.port_timeout(),
            latency_timeout: settings.latency_timeout(),
            resolver,
            hosts: HostsFile::system(),
            ping_v4: OnceCell::new(),
            ping_v6: OnceCell::new(),
        })
    }

    /// 以指定的 hosts 表取代系統 hosts 檔
    pub fn with_hosts(mut self, hosts: HostsFile) -> Self {
        self.hosts = hosts;
        self
    }

    async fn ping_client(&self, ip: IpAddr) -> Option<&surge_ping::Client> {
        let (cell, kind) = match ip {
            IpAddr::V4(_) => (&self.ping_v4, ICMP::V4),
            IpAddr::V6(_) => (&self.ping_v6, ICMP::V6),
        };
        cell.get_or_init(|| async move {
            let config = PingConfig::builder().kind(kind).build();
            match surge_ping::Client::new(&config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Cannot open {:?} socket ({}), latency falls back to the penalty value",
                        kind,
                        e
                    );
                    None
                }
            }
        })
        .await
        .as_ref()
    }
}

#[async_trait]
impl NetworkProbe for SystemNetwork {
    async fn internet_available(&self) -> bool {
        tracing::debug!("Checking connectivity via {}", self.connectivity_url);
        let result = self
            .connectivity_client
            .head(&self.connectivity_url)
            .send()
            .await
            .is_ok();
        if !result {
            tracing::debug!("Connectivity probe failed or timed out");
        }
        result
    }

    async fn http_reachable(&self, url: &str) -> TransportResult<bool> {
        match self.reach_client.get(url).send().await {
            Ok(response) => {
                tracing::debug!("{} answered {}", url, response.status());
                Ok(true)
            }
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn status_code(&self, url: &str) -> TransportResult<u16> {
        let response = self.status_client.get(url).send().await?;
        Ok(response.status().as_u16())
    }

    async fn port_open(&self, host: &str, port: u16) -> TransportResult<bool> {
        match timeout(self.port_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                tracing::debug!("{}:{} closed: {}", host, port, e);
                Ok(false)
            }
            Err(_elapsed) => {
                tracing::debug!("{}:{} timed out after {:?}", host, port, self.port_timeout);
                Ok(false)
            }
        }
    }

    async fn resolve(&self, host: &str) -> TransportResult<Option<Vec<IpAddr>>> {
        match tokio::net::lookup_host((host, RESOLVE_PORT)).await {
            Ok(addrs) => Ok(Some(addrs.map(|addr| addr.ip()).collect())),
            Err(e) => {
                tracing::debug!("Cannot resolve {}: {}", host, e);
                Ok(None)
            }
        }
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> TransportResult<Option<String>> {
        if let Some(name) = self.hosts.name_of(ip) {
            tracing::debug!("{} found in hosts file as {}", ip, name);
            return Ok(Some(name.to_string()));
        }
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(None),
                _ => Err(TransportError::Resolve(e.to_string())),
            },
        }
    }

    async fn latency(&self, ip: IpAddr) -> Option<Duration> {
        let client = self.ping_client(ip).await?;
        let mut pinger = client
            .pinger(ip, PingIdentifier(std::process::id() as u16))
            .await;
        pinger.timeout(self.latency_timeout);
        match pinger.ping(PingSequence(0), &PING_PAYLOAD).await {
            Ok((_packet, rtt)) => Some(rtt),
            Err(e) => {
                tracing::debug!("No echo reply from {}: {}", ip, e);
                None
            }
        }
    }
}
