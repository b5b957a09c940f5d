use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warmcache_application::use_cases::SyncEarlyRefreshIdentitiesUseCase;

/// Periodically republishes the early-refresh client set.
///
/// The first sync runs immediately on start.
pub struct EarlyRefreshSyncJob {
    sync: Arc<SyncEarlyRefreshIdentitiesUseCase>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl EarlyRefreshSyncJob {
    pub fn new(sync: Arc<SyncEarlyRefreshIdentitiesUseCase>) -> Self {
        Self {
            sync,
            interval_secs: 10,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval_secs,
            "Starting early-refresh sync job"
        );

        let job = Arc::clone(&self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(job.interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("EarlyRefreshSyncJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = job.sync.execute().await {
                            warn!(error = %e, "Early-refresh sync failed, keeping previous set");
                        }
                    }
                }
            }
        });
    }
}
