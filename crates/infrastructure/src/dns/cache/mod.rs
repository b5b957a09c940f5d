// Response cache: storage, freshness, admission and the late tier

pub mod classifier;
pub mod freshness;
pub mod item;
pub mod key;
pub mod late_tier;
pub mod metrics;
pub mod policy;
pub mod prefetch;
pub mod store;

pub use classifier::{CacheabilityClassifier, Cacheable, Rejection};
pub use freshness::{Freshness, MAXIMUM_DEFAULT_TTL, MINIMAL_DEFAULT_TTL};
pub use item::{HitWindow, Item, ItemClass};
pub use key::CacheKey;
pub use late_tier::LateTier;
pub use metrics::{CacheMetrics, ServerCounters};
pub use policy::{CachePolicy, TtlBounds, ZoneList};
pub use prefetch::PrefetchPolicy;
pub use store::{ItemStore, RefreshGuard};
