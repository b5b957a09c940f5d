use std::time::SystemTime;
use warmcache_domain::{DnsMessage, ResponseKind};

/// Maps a response to its semantic kind.
pub trait ResponseClassifier: Send + Sync {
    fn typify(&self, response: &DnsMessage, now: SystemTime) -> ResponseKind;
}
