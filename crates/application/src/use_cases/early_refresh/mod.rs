pub mod sync_identities;

pub use sync_identities::SyncEarlyRefreshIdentitiesUseCase;
