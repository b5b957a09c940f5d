use super::item::Item;
use std::time::{Duration, SystemTime};

/// When a popular item should be refreshed ahead of expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchPolicy {
    /// Hits inside `window` required; 0 disables prefetching.
    pub amount: u32,
    pub window: Duration,
    /// Remaining TTL, as a percentage of the original, at which to refresh.
    pub percentage: u8,
}

impl PrefetchPolicy {
    pub fn disabled() -> Self {
        Self {
            amount: 0,
            window: Duration::from_secs(60),
            percentage: 10,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.amount > 0
    }

    /// `ceil(percentage / 100 * orig_ttl)`
    pub fn threshold(&self, orig_ttl: u32) -> u64 {
        (u64::from(self.percentage) * u64::from(orig_ttl)).div_ceil(100)
    }

    /// Counts the hit and decides. Call once per fresh hit.
    pub fn should_prefetch(&self, item: &Item, remaining: u32, now: SystemTime) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let hits = item.hits().record(self.window, now);
        hits >= self.amount && u64::from(remaining) <= self.threshold(item.orig_ttl)
    }
}

impl Default for PrefetchPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}
