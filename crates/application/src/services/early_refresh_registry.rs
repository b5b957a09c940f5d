use arc_swap::ArcSwap;
use rustc_hash::FxHashSet;
use std::net::IpAddr;
use std::sync::Arc;

use crate::ports::EarlyRefreshSource;

/// Holds the latest published set of early-refresh addresses.
///
/// Readers load the current snapshot without locking; the sync use case
/// swaps in a whole new set on every successful directory listing.
pub struct EarlyRefreshRegistry {
    current: ArcSwap<FxHashSet<IpAddr>>,
}

impl EarlyRefreshRegistry {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(FxHashSet::default()),
        }
    }

    pub fn with_addresses(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            current: ArcSwap::from_pointee(addresses.into_iter().collect()),
        }
    }

    /// Replace the snapshot. Returns true when the set changed.
    pub fn publish(&self, addresses: impl IntoIterator<Item = IpAddr>) -> bool {
        let next: FxHashSet<IpAddr> = addresses.into_iter().collect();
        let changed = **self.current.load() != next;
        if changed {
            self.current.store(Arc::new(next));
        }
        changed
    }

    pub fn snapshot(&self) -> Arc<FxHashSet<IpAddr>> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for EarlyRefreshRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EarlyRefreshSource for EarlyRefreshRegistry {
    fn is_early_refresh(&self, client: IpAddr) -> bool {
        self.current.load().contains(&client)
    }
}
