use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use warmcache_application::ports::{CacheMetricsSink, HitOutcome};

/// Counters for one listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerCounters {
    pub requests: u64,
    pub success_hits: u64,
    pub denial_hits: u64,
    pub misses: u64,
    pub prefetches: u64,
    pub served_stale: u64,
    pub drops: u64,
}

impl ServerCounters {
    pub fn hits(&self) -> u64 {
        self.success_hits + self.denial_hits
    }
}

/// Cache metrics tracker
///
/// Per-listener counters in a DashMap keyed by the server label, plus a
/// process-wide request total.
#[derive(Clone, Default)]
pub struct CacheMetrics {
    total_requests: Arc<AtomicU64>,
    per_server: Arc<DashMap<Arc<str>, ServerCounters>>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self, server: &str, apply: impl FnOnce(&mut ServerCounters)) {
        if let Some(mut counters) = self.per_server.get_mut(server) {
            apply(&mut counters);
            return;
        }
        let mut counters = self.per_server.entry(Arc::from(server)).or_default();
        apply(&mut counters);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Counters for `server`; zeros when it has seen no traffic.
    pub fn snapshot(&self, server: &str) -> ServerCounters {
        self.per_server
            .get(server)
            .map(|counters| *counters)
            .unwrap_or_default()
    }

    pub fn servers(&self) -> Vec<Arc<str>> {
        self.per_server
            .iter()
            .map(|entry| Arc::clone(entry.key()))
            .collect()
    }

    /// Hits over requests across all listeners (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let (hits, requests) = self
            .per_server
            .iter()
            .fold((0u64, 0u64), |(hits, requests), entry| {
                (hits + entry.value().hits(), requests + entry.value().requests)
            });
        if requests == 0 {
            return 0.0;
        }
        hits as f64 / requests as f64
    }
}

impl CacheMetricsSink for CacheMetrics {
    fn record_request(&self, server: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.bump(server, |c| c.requests += 1);
    }

    fn record_hit(&self, server: &str, outcome: HitOutcome) {
        self.bump(server, |c| match outcome {
            HitOutcome::Success => c.success_hits += 1,
            HitOutcome::Denial => c.denial_hits += 1,
        });
    }

    fn record_miss(&self, server: &str) {
        self.bump(server, |c| c.misses += 1);
    }

    fn record_prefetch(&self, server: &str) {
        self.bump(server, |c| c.prefetches += 1);
    }

    fn record_served_stale(&self, server: &str) {
        self.bump(server, |c| c.served_stale += 1);
    }

    fn record_drop(&self, server: &str) {
        self.bump(server, |c| c.drops += 1);
    }
}
