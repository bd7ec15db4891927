// ─── Reachability ───
// "Are we online?" as an injectable capability. Resolution and installation
// branch on it; tests force either answer with `FixedReachability`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Considers the network reachable when `host` resolves to at least one
/// routable address.
pub struct DnsProbe {
    host: String,
}

impl DnsProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl Reachability for DnsProbe {
    async fn is_reachable(&self) -> bool {
        let target = format!("{}:443", self.host);
        match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::lookup_host(target)).await {
            Ok(Ok(mut addrs)) => {
                addrs.any(|addr| !addr.ip().is_loopback() && !addr.ip().is_unspecified())
            }
            Ok(Err(e)) => {
                debug!("Reachability probe for {} failed: {}", self.host, e);
                false
            }
            Err(_) => {
                debug!("Reachability probe for {} timed out", self.host);
                false
            }
        }
    }
}

/// Always answers the same; backs `--offline`.
#[derive(Debug, Clone, Copy)]
pub struct FixedReachability(pub bool);

#[async_trait]
impl Reachability for FixedReachability {
    async fn is_reachable(&self) -> bool {
        self.0
    }
}
