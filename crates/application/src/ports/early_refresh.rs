use async_trait::async_trait;
use std::net::IpAddr;
use warmcache_domain::DomainError;

/// Latest snapshot of client addresses designated for early refresh.
///
/// Read on the query path, so lookups must be cheap and non-blocking.
pub trait EarlyRefreshSource: Send + Sync {
    fn is_early_refresh(&self, client: IpAddr) -> bool;
}

/// External directory listing the early-refresh client addresses.
#[async_trait]
pub trait EarlyRefreshDirectory: Send + Sync {
    async fn list_early_refresh_addresses(&self) -> Result<Vec<IpAddr>, DomainError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
