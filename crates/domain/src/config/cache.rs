use serde::{Deserialize, Serialize};

/// Response cache configuration
///
/// TTL bounds are applied once, when a response is stored. The floor is
/// applied before the ceiling, so a ceiling of zero disables caching of that
/// class entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum entries in the positive (NOERROR / delegation) store
    #[serde(default = "default_capacity")]
    pub positive_capacity: usize,

    /// Maximum entries in the negative (NXDOMAIN / NODATA / server error) store
    #[serde(default = "default_capacity")]
    pub negative_capacity: usize,

    #[serde(default = "default_min_ttl")]
    pub positive_min_ttl: u32,

    #[serde(default = "default_positive_max_ttl")]
    pub positive_max_ttl: u32,

    #[serde(default = "default_min_ttl")]
    pub negative_min_ttl: u32,

    #[serde(default = "default_negative_max_ttl")]
    pub negative_max_ttl: u32,

    /// Ceiling for SERVFAIL / NOTIMP answers; 0 disables caching them
    #[serde(default = "default_servfail_max_ttl")]
    pub servfail_max_ttl: u32,

    /// How long past expiry an entry may still be served (0 = disabled)
    #[serde(default)]
    pub serve_stale_secs: u64,

    /// Re-check upstream before serving a stale entry
    #[serde(default)]
    pub verify_stale: bool,

    /// Render the original TTL instead of the remaining TTL
    #[serde(default)]
    pub keep_ttl: bool,

    /// Hits within `prefetch_window_secs` needed before prefetching (0 = disabled)
    #[serde(default)]
    pub prefetch_amount: u32,

    #[serde(default = "default_prefetch_window_secs")]
    pub prefetch_window_secs: u64,

    /// Prefetch once remaining TTL is at or below this percentage of the original
    #[serde(default = "default_prefetch_percentage")]
    pub prefetch_percentage: u8,

    /// Extra TTL seconds granted to late-tier copies
    #[serde(default)]
    pub late_bonus_secs: u32,

    /// Zones whose positive answers are never cached
    #[serde(default)]
    pub positive_exceptions: Vec<String>,

    /// Zones whose negative and error answers are never cached
    #[serde(default)]
    pub negative_exceptions: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_capacity: default_capacity(),
            negative_capacity: default_capacity(),
            positive_min_ttl: default_min_ttl(),
            positive_max_ttl: default_positive_max_ttl(),
            negative_min_ttl: default_min_ttl(),
            negative_max_ttl: default_negative_max_ttl(),
            servfail_max_ttl: default_servfail_max_ttl(),
            serve_stale_secs: 0,
            verify_stale: false,
            keep_ttl: false,
            prefetch_amount: 0,
            prefetch_window_secs: default_prefetch_window_secs(),
            prefetch_percentage: default_prefetch_percentage(),
            late_bonus_secs: 0,
            positive_exceptions: Vec::new(),
            negative_exceptions: Vec::new(),
        }
    }
}

fn default_capacity() -> usize {
    10_000
}

fn default_min_ttl() -> u32 {
    5
}

fn default_positive_max_ttl() -> u32 {
    3600
}

fn default_negative_max_ttl() -> u32 {
    1800
}

fn default_servfail_max_ttl() -> u32 {
    5
}

fn default_prefetch_window_secs() -> u64 {
    60
}

fn default_prefetch_percentage() -> u8 {
    10
}
