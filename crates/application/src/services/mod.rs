pub mod early_refresh_registry;

pub use early_refresh_registry::EarlyRefreshRegistry;
