use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use super::cache::CacheConfig;
use super::early_refresh::{EarlyRefreshConfig, EarlyRefreshSourceKind};
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;

const DEFAULT_CONFIG_PATHS: &[&str] = &["warmcache.toml", "/etc/warmcache/config.toml"];

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub early_refresh: EarlyRefreshConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream_servers: Option<Vec<String>>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load from `path`, or from the first default location that exists,
    /// falling back to built-in defaults.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let resolved = match path {
            Some(p) => Some(p.to_string()),
            None => DEFAULT_CONFIG_PATHS
                .iter()
                .find(|candidate| Path::new(candidate).exists())
                .map(|candidate| candidate.to_string()),
        };

        let mut config = match resolved {
            Some(p) => Self::from_file(&p)?,
            None => Config::default(),
        };

        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(servers) = overrides.upstream_servers {
            self.upstream.servers = servers;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "at least one upstream server is required".into(),
            ));
        }
        for server in &self.upstream.servers {
            parse_upstream_address(server).ok_or_else(|| {
                ConfigError::Validation(format!("invalid upstream server address: {}", server))
            })?;
        }
        if self.upstream.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "upstream.query_timeout_ms must be greater than 0".into(),
            ));
        }

        let cache = &self.cache;
        if cache.positive_capacity == 0 || cache.negative_capacity == 0 {
            return Err(ConfigError::Validation(
                "cache capacities must be greater than 0".into(),
            ));
        }
        if cache.positive_min_ttl > cache.positive_max_ttl {
            return Err(ConfigError::Validation(format!(
                "cache.positive_min_ttl ({}) exceeds cache.positive_max_ttl ({})",
                cache.positive_min_ttl, cache.positive_max_ttl
            )));
        }
        if cache.negative_min_ttl > cache.negative_max_ttl {
            return Err(ConfigError::Validation(format!(
                "cache.negative_min_ttl ({}) exceeds cache.negative_max_ttl ({})",
                cache.negative_min_ttl, cache.negative_max_ttl
            )));
        }
        if cache.prefetch_percentage > 100 {
            return Err(ConfigError::Validation(format!(
                "cache.prefetch_percentage must be between 0 and 100, got {}",
                cache.prefetch_percentage
            )));
        }
        if cache.prefetch_amount > 0 && cache.prefetch_window_secs == 0 {
            return Err(ConfigError::Validation(
                "cache.prefetch_window_secs must be greater than 0 when prefetch is enabled"
                    .into(),
            ));
        }

        let early = &self.early_refresh;
        match early.source {
            EarlyRefreshSourceKind::Disabled => {}
            EarlyRefreshSourceKind::Static => {
                for address in &early.addresses {
                    address.parse::<IpAddr>().map_err(|_| {
                        ConfigError::Validation(format!(
                            "invalid early_refresh address: {}",
                            address
                        ))
                    })?;
                }
            }
            EarlyRefreshSourceKind::Kubernetes => {
                if early.client_cert.is_some() != early.client_key.is_some() {
                    return Err(ConfigError::Validation(
                        "early_refresh.client_cert and client_key must be set together".into(),
                    ));
                }
                if early.label_selector.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "early_refresh.label_selector must not be empty".into(),
                    ));
                }
            }
        }
        if early.source != EarlyRefreshSourceKind::Disabled && early.sync_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "early_refresh.sync_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

/// Accepts `ip:port`, `[v6]:port`, or a bare IP (port 53).
pub fn parse_upstream_address(value: &str) -> Option<SocketAddr> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some(addr);
    }
    value
        .parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, 53))
}
