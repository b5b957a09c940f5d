use serde::{Deserialize, Serialize};

/// Where the set of early-refresh client addresses comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EarlyRefreshSourceKind {
    /// No client is designated; the late tier stays empty.
    #[default]
    Disabled,
    /// Fixed list from `addresses`.
    Static,
    /// Pods matching `label_selector`, listed through the Kubernetes API.
    Kubernetes,
}

/// Early-refresh identity directory configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EarlyRefreshConfig {
    #[serde(default)]
    pub source: EarlyRefreshSourceKind,

    /// Client IPs for the `static` source
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default = "default_label_selector")]
    pub label_selector: String,

    /// API server URL; empty means in-cluster configuration
    #[serde(default)]
    pub api_server: Option<String>,

    /// PEM file with the API server CA
    #[serde(default)]
    pub ca_cert: Option<String>,

    /// PEM client certificate (requires `client_key`)
    #[serde(default)]
    pub client_cert: Option<String>,

    #[serde(default)]
    pub client_key: Option<String>,

    /// Bearer token file; in-cluster default is the service-account token
    #[serde(default)]
    pub token_file: Option<String>,

    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EarlyRefreshConfig {
    fn default() -> Self {
        Self {
            source: EarlyRefreshSourceKind::Disabled,
            addresses: Vec::new(),
            label_selector: default_label_selector(),
            api_server: None,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            token_file: None,
            sync_interval_secs: default_sync_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_label_selector() -> String {
    "k8s-cache.coredns.io/early-refresh=true".to_string()
}

fn default_sync_interval_secs() -> u64 {
    10
}

fn default_request_timeout_ms() -> u64 {
    5000
}
