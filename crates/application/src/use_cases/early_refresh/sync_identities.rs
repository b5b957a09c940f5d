use crate::ports::EarlyRefreshDirectory;
use crate::services::EarlyRefreshRegistry;
use std::sync::Arc;
use tracing::{debug, info};
use warmcache_domain::DomainError;

/// Use case: Publish the directory's current early-refresh addresses
/// Should be run periodically (e.g., every 10 seconds)
///
/// A failed listing leaves the previous snapshot in place.
pub struct SyncEarlyRefreshIdentitiesUseCase {
    directory: Arc<dyn EarlyRefreshDirectory>,
    registry: Arc<EarlyRefreshRegistry>,
}

impl SyncEarlyRefreshIdentitiesUseCase {
    pub fn new(
        directory: Arc<dyn EarlyRefreshDirectory>,
        registry: Arc<EarlyRefreshRegistry>,
    ) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Returns the number of addresses now designated.
    pub async fn execute(&self) -> Result<usize, DomainError> {
        debug!(directory = self.directory.name(), "Listing early-refresh addresses");

        let addresses = self.directory.list_early_refresh_addresses().await?;
        let count = addresses.len();

        if self.registry.publish(addresses) {
            info!(
                directory = self.directory.name(),
                addresses = self.registry.len(),
                "Early-refresh identities updated"
            );
        } else {
            debug!(addresses = count, "Early-refresh identities unchanged");
        }

        Ok(self.registry.len())
    }
}
