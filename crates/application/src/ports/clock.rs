use std::time::SystemTime;

/// Source of wall-clock time for expiry bookkeeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}
