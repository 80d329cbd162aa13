use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

#[cfg(not(windows))]
pub const SYSTEM_HOSTS_PATH: &str = "/etc/hosts";
#[cfg(windows)]
pub const SYSTEM_HOSTS_PATH: &str = r"C:\Windows\System32\drivers\etc\hosts";

/// hosts 檔的反查表：每個位址對應到第一個 (正式) 名稱
#[derive(Debug, Clone, Default)]
pub struct HostsFile {
    names: HashMap<IpAddr, String>,
}

impl HostsFile {
    pub fn parse(content: &str) -> Self {
        let mut names = HashMap::new();
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let (Some(addr), Some(name)) = (fields.next(), fields.next()) else {
                continue;
            };
            if let Ok(ip) = addr.parse::<IpAddr>() {
                // 同一位址重複出現時以先出現者為準
                names.entry(ip).or_insert_with(|| name.to_string());
            }
        }
        Self { names }
    }

    /// 讀不到檔案時回傳空表，反查改由 DNS 處理
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let hosts = Self::parse(&content);
                tracing::debug!("Loaded {} hosts entries from {}", hosts.len(), path.display());
                hosts
            }
            Err(e) => {
                tracing::debug!("Cannot read hosts file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn system() -> Self {
        Self::load(SYSTEM_HOSTS_PATH)
    }

    pub fn name_of(&self, ip: IpAddr) -> Option<&str> {
        self.names.get(&ip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
