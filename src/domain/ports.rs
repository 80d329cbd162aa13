use crate::utils::error::TransportError;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// 探測引擎對外的網路操作。每個方法只負責一次呼叫，
/// 連線守衛與關卡判斷都在引擎內處理。
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// 對固定的外部端點做輕量請求，判斷本機是否能上網
    async fn internet_available(&self) -> bool;

    /// 對 URL 發出 GET；逾時回傳 `Ok(false)`，連線失敗回傳錯誤
    async fn http_reachable(&self, url: &str) -> TransportResult<bool>;

    /// 取得 HTTP 狀態碼（含 4xx/5xx）
    async fn status_code(&self, url: &str) -> TransportResult<u16>;

    /// TCP 連線是否成功；拒絕或逾時都算關閉
    async fn port_open(&self, host: &str, port: u16) -> TransportResult<bool>;

    /// 正向解析，無法解析時回傳 `Ok(None)`
    async fn resolve(&self, host: &str) -> TransportResult<Option<Vec<IpAddr>>>;

    /// 反向解析，無法取得主機名稱時回傳 `Ok(None)`
    async fn reverse_lookup(&self, ip: IpAddr) -> TransportResult<Option<String>>;

    /// ICMP echo 往返時間，沒有回應時回傳 `None`
    async fn latency(&self, ip: IpAddr) -> Option<Duration>;
}
