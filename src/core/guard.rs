use crate::config::ProbeSettings;
use crate::domain::ports::{NetworkProbe, TransportResult};
use crate::utils::error::TransportError;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 經過連線守衛的呼叫結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Ok(T),
    /// 本機無法上網，未執行被包裝的呼叫
    ConnectionDown,
    TransportError(TransportError),
}

impl<T> Guarded<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Guarded::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_connection_down(&self) -> bool {
        matches!(self, Guarded::ConnectionDown)
    }
}

/// 在每次對外呼叫之前確認本機網路，並把傳輸錯誤轉成 `Guarded`
#[derive(Debug)]
pub struct ConnectivityGuard {
    pause: Duration,
    max_attempts: u32,
    cache_for: Duration,
    last_online: Mutex<Option<Instant>>,
}

impl ConnectivityGuard {
    pub fn new(pause: Duration, max_attempts: u32, cache_for: Duration) -> Self {
        Self {
            pause,
            max_attempts: max_attempts.max(1),
            cache_for,
            last_online: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self::new(
            settings.offline_pause(),
            settings.offline_max_attempts,
            settings.connectivity_cache(),
        )
    }

    fn recently_online(&self) -> bool {
        if self.cache_for.is_zero() {
            return false;
        }
        self.last_online
            .lock()
            .ok()
            .and_then(|last| *last)
            .map(|at| at.elapsed() < self.cache_for)
            .unwrap_or(false)
    }

    fn mark_online(&self) {
        if let Ok(mut last) = self.last_online.lock() {
            *last = Some(Instant::now());
        }
    }

    /// 最多檢查 `max_attempts` 次，每次失敗後暫停 `pause`
    pub async fn ensure_online<N: NetworkProbe + ?Sized>(&self, network: &N) -> bool {
        if self.recently_online() {
            return true;
        }

        for attempt in 1..=self.max_attempts {
            if network.internet_available().await {
                self.mark_online();
                return true;
            }
            tracing::warn!(
                "⚠️ No internet connection (attempt {}/{}), pausing {:?}",
                attempt,
                self.max_attempts,
                self.pause
            );
            tokio::time::sleep(self.pause).await;
        }

        if let Ok(mut last) = self.last_online.lock() {
            *last = None;
        }
        false
    }

    pub async fn call<N, T, F, Fut>(&self, network: &N, op: F) -> Guarded<T>
    where
        N: NetworkProbe + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        if !self.ensure_online(network).await {
            return Guarded::ConnectionDown;
        }

        match op().await {
            Ok(value) => Guarded::Ok(value),
            Err(err) => {
                tracing::debug!("Guarded call failed: {}", err);
                Guarded::TransportError(err)
            }
        }
    }

    /// 只關心可達性的呼叫：傳輸錯誤視為不可達
    pub async fn reachability<N, F, Fut>(&self, network: &N, op: F) -> Guarded<bool>
    where
        N: NetworkProbe + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TransportResult<bool>>,
    {
        match self.call(network, op).await {
            Guarded::TransportError(_) => Guarded::Ok(false),
            other => other,
        }
    }
}

impl Default for ConnectivityGuard {
    fn default() -> Self {
        Self::from_settings(&ProbeSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::assert_ok;

    /// 依序回傳預先排好的連線狀態
    struct FlakyNetwork {
        online: Vec<bool>,
        checks: AtomicUsize,
    }

    impl FlakyNetwork {
        fn new(online: Vec<bool>) -> Self {
            Self {
                online,
                checks: AtomicUsize::new(0),
            }
        }

        fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkProbe for FlakyNetwork {
        async fn internet_available(&self) -> bool {
            let i = self.checks.fetch_add(1, Ordering::SeqCst);
            self.online.get(i).copied().unwrap_or(false)
        }

        async fn http_reachable(&self, _url: &str) -> TransportResult<bool> {
            Ok(true)
        }

        async fn status_code(&self, _url: &str) -> TransportResult<u16> {
            Ok(200)
        }

        async fn port_open(&self, _host: &str, _port: u16) -> TransportResult<bool> {
            Ok(true)
        }

        async fn resolve(&self, _host: &str) -> TransportResult<Option<Vec<IpAddr>>> {
            Ok(None)
        }

        async fn reverse_lookup(&self, _ip: IpAddr) -> TransportResult<Option<String>> {
            Ok(None)
        }

        async fn latency(&self, _ip: IpAddr) -> Option<Duration> {
            None
        }
    }

    fn guard(max_attempts: u32, cache_for: Duration) -> ConnectivityGuard {
        ConnectivityGuard::new(Duration::from_millis(1), max_attempts, cache_for)
    }

    #[tokio::test]
    async fn test_online_call_returns_value() {
        let network = FlakyNetwork::new(vec![true]);
        let result = guard(3, Duration::ZERO)
            .call(&network, || async { Ok::<_, TransportError>(42u16) })
            .await;

        assert_eq!(result, Guarded::Ok(42));
        assert_eq!(network.checks(), 1);
    }

    #[tokio::test]
    async fn test_offline_is_bounded_and_skips_call() {
        let network = FlakyNetwork::new(vec![false; 10]);
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();

        let result = guard(3, Duration::ZERO)
            .call(&network, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransportError>(())
            })
            .await;

        assert!(result.is_connection_down());
        assert_eq!(network.checks(), 3);
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_outage() {
        let network = FlakyNetwork::new(vec![false, false, true]);
        let result = guard(5, Duration::ZERO)
            .call(&network, || async { Ok::<_, TransportError>("up") })
            .await;

        assert_eq!(result, Guarded::Ok("up"));
        assert_eq!(network.checks(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_is_typed() {
        let network = FlakyNetwork::new(vec![true, true]);
        let g = guard(1, Duration::ZERO);

        let result = g
            .call(&network, || async {
                Err::<u16, _>(TransportError::Connection("refused".to_string()))
            })
            .await;
        assert_eq!(
            result,
            Guarded::TransportError(TransportError::Connection("refused".to_string()))
        );

        let reachable = g
            .reachability(&network, || async {
                Err(TransportError::Connection("reset".to_string()))
            })
            .await;
        assert_eq!(reachable, Guarded::Ok(false));
    }

    #[tokio::test]
    async fn test_cache_rate_limits_connectivity_checks() {
        let network = FlakyNetwork::new(vec![true]);
        let g = guard(1, Duration::from_secs(60));

        for _ in 0..3 {
            let result = g.call(&network, || async { Ok::<_, TransportError>(()) }).await;
            assert_ok!(result.ok().ok_or("connection down"));
        }
        assert_eq!(network.checks(), 1);
    }
}
