use async_trait::async_trait;
use warmcache_domain::{DnsMessage, DnsRequest, DomainError};

/// Anything that turns a query into a response: the upstream forwarder, or a
/// decorator such as the cache layer wrapping one.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, request: &DnsRequest) -> Result<DnsMessage, DomainError>;
}
