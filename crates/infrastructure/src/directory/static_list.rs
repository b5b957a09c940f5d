use async_trait::async_trait;
use std::net::IpAddr;
use warmcache_application::ports::EarlyRefreshDirectory;
use warmcache_domain::{DomainError, EarlyRefreshConfig};

/// Fixed set of early-refresh addresses from configuration.
pub struct StaticDirectory {
    addresses: Vec<IpAddr>,
}

impl StaticDirectory {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self { addresses }
    }

    pub fn from_config(config: &EarlyRefreshConfig) -> Result<Self, DomainError> {
        let addresses = config
            .addresses
            .iter()
            .map(|raw| {
                raw.parse::<IpAddr>().map_err(|_| {
                    DomainError::InvalidIpAddress(format!("Invalid early-refresh address: {}", raw))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(addresses))
    }
}

#[async_trait]
impl EarlyRefreshDirectory for StaticDirectory {
    async fn list_early_refresh_addresses(&self) -> Result<Vec<IpAddr>, DomainError> {
        Ok(self.addresses.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
