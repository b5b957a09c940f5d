#![allow(dead_code)]

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use warmcache_application::ports::EarlyRefreshDirectory;
use warmcache_domain::DomainError;

// ============================================================================
// Mock EarlyRefreshDirectory
// ============================================================================

#[derive(Clone)]
pub struct MockDirectory {
    addresses: Arc<RwLock<Vec<IpAddr>>>,
    should_fail: Arc<RwLock<bool>>,
    calls: Arc<AtomicU64>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            addresses: Arc::new(RwLock::new(Vec::new())),
            should_fail: Arc::new(RwLock::new(false)),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_addresses(addresses: &[&str]) -> Self {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        Self {
            addresses: Arc::new(RwLock::new(parsed)),
            ..Self::new()
        }
    }

    pub async fn set_addresses(&self, addresses: &[&str]) {
        *self.addresses.write().await = addresses.iter().map(|a| a.parse().unwrap()).collect();
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EarlyRefreshDirectory for MockDirectory {
    async fn list_early_refresh_addresses(&self) -> Result<Vec<IpAddr>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.should_fail.read().await {
            return Err(DomainError::DirectoryError("mock directory failure".into()));
        }
        Ok(self.addresses.read().await.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
