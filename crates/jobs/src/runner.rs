use crate::EarlyRefreshSyncJob;
use std::sync::Arc;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Use the builder pattern to register jobs, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// JobRunner::new()
///     .with_early_refresh_sync(EarlyRefreshSyncJob::new(sync).with_interval(10))
///     .start()
///     .await;
/// ```
pub struct JobRunner {
    early_refresh_sync: Option<EarlyRefreshSyncJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            early_refresh_sync: None,
        }
    }

    pub fn with_early_refresh_sync(mut self, job: EarlyRefreshSyncJob) -> Self {
        self.early_refresh_sync = Some(job);
        self
    }

    /// Start all registered background jobs.
    pub async fn start(self) {
        info!("Starting background job runner");

        if let Some(job) = self.early_refresh_sync {
            Arc::new(job).start().await;
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
