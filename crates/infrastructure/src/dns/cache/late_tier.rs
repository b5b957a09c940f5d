use super::freshness::{self, Freshness};
use super::item::{Item, ItemClass};
use super::key::CacheKey;
use super::store::ItemStore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;
use warmcache_domain::{Question, ResponseCode};

/// Positive answers fetched on behalf of early-refresh clients, kept a
/// little longer than the primary copy.
///
/// Ordinary clients fall back to this tier when the primary stores have
/// nothing fresh, so they keep getting fresh answers while an early-refresh
/// client repopulates the primary entry.
pub struct LateTier {
    store: ItemStore,
    bonus: u32,
    stale_window: Duration,
}

impl LateTier {
    /// The stale window is the primary window reduced by `bonus`, so late
    /// items stop being served at about the same moment as primary ones.
    pub fn new(capacity: usize, bonus: u32, primary_stale_window: Duration) -> Self {
        let stale_window =
            primary_stale_window.saturating_sub(Duration::from_secs(u64::from(bonus)));
        Self {
            store: ItemStore::new("late", capacity),
            bonus,
            stale_window,
        }
    }

    pub fn stale_window(&self) -> Duration {
        self.stale_window
    }

    /// Copy a freshly stored primary item. Only NOERROR success items are
    /// copied, and a late item that is still fresh is left in place.
    pub fn offer(&self, key: CacheKey, item: &Item, now: SystemTime) -> bool {
        if item.class != ItemClass::Success || item.response_code != ResponseCode::NoError {
            return false;
        }

        let copy = Arc::new(item.late_copy(self.bonus, now));
        let stored = self
            .store
            .add_unless(key, copy, |current| current.ttl_remaining(now) > 0);
        if stored {
            debug!(
                domain = %item.name,
                record_type = %item.qtype,
                ttl = item.orig_ttl.saturating_add(self.bonus),
                "Late tier updated"
            );
        }
        stored
    }

    /// Fresh or stale-but-servable late item for `question`.
    pub fn lookup(
        &self,
        key: CacheKey,
        question: &Question,
        now: SystemTime,
    ) -> Option<(Arc<Item>, Freshness)> {
        let item = self.store.get(key)?;
        if !item.matches(question) {
            return None;
        }
        let state = freshness::classify(item.ttl_remaining(now), self.stale_window);
        state.is_usable().then_some((item, state))
    }

    /// Drop the late copy once a negative answer supersedes it.
    pub(crate) fn remove(&self, key: CacheKey) -> bool {
        self.store.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
