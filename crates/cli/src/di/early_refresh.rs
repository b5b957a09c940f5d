use std::sync::Arc;
use tracing::info;
use warmcache_application::ports::EarlyRefreshDirectory;
use warmcache_application::services::EarlyRefreshRegistry;
use warmcache_application::use_cases::SyncEarlyRefreshIdentitiesUseCase;
use warmcache_domain::{Config, EarlyRefreshSourceKind};
use warmcache_infrastructure::directory::{KubernetesPodDirectory, StaticDirectory};

pub struct EarlyRefreshServices {
    pub registry: Arc<EarlyRefreshRegistry>,
    pub sync: Option<Arc<SyncEarlyRefreshIdentitiesUseCase>>,
    pub sync_interval_secs: u64,
}

impl EarlyRefreshServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let early = &config.early_refresh;
        let registry = Arc::new(EarlyRefreshRegistry::new());

        let directory: Option<Arc<dyn EarlyRefreshDirectory>> = match early.source {
            EarlyRefreshSourceKind::Disabled => None,
            EarlyRefreshSourceKind::Static => Some(Arc::new(StaticDirectory::from_config(early)?)),
            EarlyRefreshSourceKind::Kubernetes => {
                Some(Arc::new(KubernetesPodDirectory::from_config(early)?))
            }
        };

        let sync = directory.map(|directory| {
            info!(
                directory = directory.name(),
                interval_secs = early.sync_interval_secs,
                "Early-refresh directory configured"
            );
            Arc::new(SyncEarlyRefreshIdentitiesUseCase::new(
                directory,
                Arc::clone(&registry),
            ))
        });

        Ok(Self {
            registry,
            sync,
            sync_interval_secs: early.sync_interval_secs,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sync.is_some()
    }
}
