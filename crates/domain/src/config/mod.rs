//! Configuration module for Warmcache
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: Main configuration and CLI overrides
//! - `server`: UDP listener binding
//! - `upstream`: Upstream resolvers and timeout
//! - `cache`: Capacities, TTL bounds, stale serving, prefetch, exceptions
//! - `early_refresh`: Directory of early-refresh client identities
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod cache;
pub mod early_refresh;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use cache::CacheConfig;
pub use early_refresh::{EarlyRefreshConfig, EarlyRefreshSourceKind};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{parse_upstream_address, CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
