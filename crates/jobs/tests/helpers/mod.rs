#![allow(dead_code)]

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use warmcache_application::ports::EarlyRefreshDirectory;
use warmcache_domain::DomainError;

// ============================================================================
// Mock EarlyRefreshDirectory
// ============================================================================

pub struct MockDirectory {
    addresses: Mutex<Vec<IpAddr>>,
    call_count: Arc<AtomicU64>,
    should_fail: AtomicBool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::with_addresses(&[])
    }

    pub fn with_addresses(addresses: &[&str]) -> Self {
        Self {
            addresses: Mutex::new(addresses.iter().map(|a| a.parse().unwrap()).collect()),
            call_count: Arc::new(AtomicU64::new(0)),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    pub fn set_addresses(&self, addresses: &[&str]) {
        *self.addresses.lock().unwrap() = addresses.iter().map(|a| a.parse().unwrap()).collect();
    }
}

#[async_trait]
impl EarlyRefreshDirectory for MockDirectory {
    async fn list_early_refresh_addresses(&self) -> Result<Vec<IpAddr>, DomainError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(DomainError::DirectoryError("mock directory unavailable".into()));
        }
        Ok(self.addresses.lock().unwrap().clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
