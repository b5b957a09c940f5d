pub mod early_refresh;

pub use early_refresh::SyncEarlyRefreshIdentitiesUseCase;
