use std::fmt;

/// Which store produced a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitOutcome {
    Success,
    Denial,
}

impl HitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitOutcome::Success => "success",
            HitOutcome::Denial => "denial",
        }
    }
}

impl fmt::Display for HitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side-effect-only counters, labeled by the listener that took the query.
///
/// Implementations must not block and must not fail.
pub trait CacheMetricsSink: Send + Sync {
    fn record_request(&self, server: &str);

    fn record_hit(&self, server: &str, outcome: HitOutcome);

    fn record_miss(&self, server: &str);

    fn record_prefetch(&self, _server: &str) {}

    fn record_served_stale(&self, _server: &str) {}

    /// Upstream answer discarded because it did not match the question.
    fn record_drop(&self, _server: &str) {}
}
