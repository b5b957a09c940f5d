use super::freshness::compute_ttl;
use super::prefetch::PrefetchPolicy;
use std::time::Duration;
use warmcache_domain::{CacheConfig, ResponseKind};

/// Inclusive floor and ceiling applied to a derived message TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlBounds {
    pub min: u32,
    pub max: u32,
}

impl TtlBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, message_ttl: u32) -> u32 {
        compute_ttl(message_ttl, self.min, self.max)
    }
}

/// Zones exempted from caching, matched on label boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneList {
    zones: Vec<String>,
}

impl ZoneList {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut zones: Vec<String> = zones
            .into_iter()
            .map(|zone| normalize(zone.as_ref()))
            .collect();
        zones.sort();
        zones.dedup();
        Self { zones }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Most specific zone containing `name`.
    pub fn matches(&self, name: &str) -> Option<&str> {
        if self.zones.is_empty() {
            return None;
        }
        let name = normalize(name);
        self.zones
            .iter()
            .filter(|zone| is_in_zone(&name, zone))
            .max_by_key(|zone| zone.len())
            .map(String::as_str)
    }
}

fn normalize(name: &str) -> String {
    let mut name = name.trim().to_ascii_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

fn is_in_zone(name: &str, zone: &str) -> bool {
    if zone == "." || name == zone {
        return true;
    }
    name.strip_suffix(zone)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Runtime form of [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub positive_capacity: usize,
    pub negative_capacity: usize,
    pub positive_ttl: TtlBounds,
    pub negative_ttl: TtlBounds,
    /// Lifetime of SERVFAIL / NOTIMP entries; 0 disables caching them.
    pub servfail_ttl: u32,
    pub stale_window: Duration,
    pub verify_stale: bool,
    pub keep_ttl: bool,
    pub prefetch: PrefetchPolicy,
    pub late_bonus: u32,
    pub positive_exceptions: ZoneList,
    pub negative_exceptions: ZoneList,
}

impl CachePolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            positive_capacity: config.positive_capacity,
            negative_capacity: config.negative_capacity,
            positive_ttl: TtlBounds::new(config.positive_min_ttl, config.positive_max_ttl),
            negative_ttl: TtlBounds::new(config.negative_min_ttl, config.negative_max_ttl),
            servfail_ttl: config.servfail_max_ttl,
            stale_window: Duration::from_secs(config.serve_stale_secs),
            verify_stale: config.verify_stale,
            keep_ttl: config.keep_ttl,
            prefetch: PrefetchPolicy {
                amount: config.prefetch_amount,
                window: Duration::from_secs(config.prefetch_window_secs),
                percentage: config.prefetch_percentage,
            },
            late_bonus: config.late_bonus_secs,
            positive_exceptions: ZoneList::new(&config.positive_exceptions),
            negative_exceptions: ZoneList::new(&config.negative_exceptions),
        }
    }

    /// Storage duration for a response of `kind` whose records carry
    /// `message_ttl`.
    pub fn duration_for(&self, kind: ResponseKind, message_ttl: u32) -> u32 {
        match kind {
            ResponseKind::NameError | ResponseKind::NoData => self.negative_ttl.apply(message_ttl),
            ResponseKind::ServerError => self.servfail_ttl,
            _ => self.positive_ttl.apply(message_ttl),
        }
    }

    pub fn exceptions_for(&self, positive: bool) -> &ZoneList {
        if positive {
            &self.positive_exceptions
        } else {
            &self.negative_exceptions
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
