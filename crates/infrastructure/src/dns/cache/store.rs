use super::item::Item;
use super::key::CacheKey;
use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Entries {
    lru: LruCache<CacheKey, Arc<Item>, FxBuildHasher>,
    refreshing: FxHashSet<CacheKey>,
}

/// Capacity-bounded LRU map from [`CacheKey`] to [`Item`].
///
/// The bound covers the whole map: the least recently used entry is evicted
/// only once `capacity` is exceeded. Keys with a background refresh in flight
/// are tracked under the same lock as the entries.
#[derive(Clone)]
pub struct ItemStore {
    name: &'static str,
    inner: Arc<Mutex<Entries>>,
    capacity: usize,
}

impl ItemStore {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        debug!(store = name, capacity = capacity, "Item store created");

        Self {
            name,
            inner: Arc::new(Mutex::new(Entries {
                lru: LruCache::with_hasher(bound, FxBuildHasher),
                refreshing: FxHashSet::default(),
            })),
            capacity,
        }
    }

    #[inline]
    fn entries(&self) -> MutexGuard<'_, Entries> {
        lock(&self.inner)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up and mark as most recently used.
    pub fn get(&self, key: CacheKey) -> Option<Arc<Item>> {
        self.entries().lru.get(&key).cloned()
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: CacheKey) -> Option<Arc<Item>> {
        self.entries().lru.peek(&key).cloned()
    }

    /// Insert or replace; evicts the least recently used entry when full.
    pub fn add(&self, key: CacheKey, item: Arc<Item>) {
        if let Some((evicted, _)) = self.entries().lru.push(key, item) {
            if evicted != key {
                debug!(store = self.name, key = %evicted, "Evicted least recently used item");
            }
        }
    }

    /// Insert unless the current entry satisfies `keep`, checked under the
    /// store lock. Returns whether `item` was stored.
    pub fn add_unless(
        &self,
        key: CacheKey,
        item: Arc<Item>,
        keep: impl FnOnce(&Item) -> bool,
    ) -> bool {
        let mut entries = self.entries();
        if entries.lru.peek(&key).is_some_and(|current| keep(&**current)) {
            return false;
        }
        entries.lru.put(key, item);
        true
    }

    pub(crate) fn remove(&self, key: CacheKey) -> Option<Arc<Item>> {
        self.entries().lru.pop(&key)
    }

    pub fn len(&self) -> usize {
        self.entries().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().lru.is_empty()
    }

    /// Claim the refresh slot for `key`. `None` when a refresh is already
    /// in flight; the slot is released when the guard drops.
    pub fn try_begin_refresh(&self, key: CacheKey) -> Option<RefreshGuard> {
        if !self.entries().refreshing.insert(key) {
            return None;
        }
        Some(RefreshGuard {
            inner: Arc::clone(&self.inner),
            key,
        })
    }

    pub fn is_refreshing(&self, key: CacheKey) -> bool {
        self.entries().refreshing.contains(&key)
    }
}

/// Holds a refresh slot; dropping it lets the next refresh for the key start.
pub struct RefreshGuard {
    inner: Arc<Mutex<Entries>>,
    key: CacheKey,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        lock(&self.inner).refreshing.remove(&self.key);
    }
}

#[inline]
fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
