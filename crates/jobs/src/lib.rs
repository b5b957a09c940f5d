pub mod early_refresh_sync;
pub mod runner;

pub use early_refresh_sync::EarlyRefreshSyncJob;
pub use runner::JobRunner;
