use serde::{Deserialize, Serialize};

/// Upstream resolvers queried on cache misses, tried in order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// `ip:port` socket addresses (port defaults to 53 when omitted)
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Per-server query timeout in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_query_timeout_ms() -> u64 {
    2000
}
