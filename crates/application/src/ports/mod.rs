pub mod cache_metrics;
pub mod clock;
pub mod dns_resolver;
pub mod early_refresh;
pub mod response_classifier;

pub use cache_metrics::{CacheMetricsSink, HitOutcome};
pub use clock::Clock;
pub use dns_resolver::DnsResolver;
pub use early_refresh::{EarlyRefreshDirectory, EarlyRefreshSource};
pub use response_classifier::ResponseClassifier;
