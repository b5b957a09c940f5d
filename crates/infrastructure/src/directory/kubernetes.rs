use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, Url};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use warmcache_application::ports::EarlyRefreshDirectory;
use warmcache_domain::{DomainError, EarlyRefreshConfig};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Lists pods matching a label selector across all namespaces and reports
/// their IP addresses.
///
/// Talks to the API server directly over HTTPS. Without an explicit
/// `api_server` it uses the in-cluster service account.
pub struct KubernetesPodDirectory {
    client: Client,
    pods_url: Url,
    token_file: Option<PathBuf>,
}

impl KubernetesPodDirectory {
    pub fn from_config(config: &EarlyRefreshConfig) -> Result<Self, DomainError> {
        let in_cluster = config.api_server.is_none();

        let api_server = match &config.api_server {
            Some(server) => server.trim_end_matches('/').to_string(),
            None => in_cluster_api_server()?,
        };

        let ca_cert = config
            .ca_cert
            .clone()
            .or_else(|| in_cluster.then(|| format!("{}/ca.crt", SERVICE_ACCOUNT_DIR)));
        let token_file = config
            .token_file
            .clone()
            .or_else(|| in_cluster.then(|| format!("{}/token", SERVICE_ACCOUNT_DIR)))
            .map(PathBuf::from);

        let mut builder = Client::builder()
            .user_agent(concat!("warmcache/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if let Some(path) = &ca_cert {
            let pem = read_file(path)?;
            let certificate = Certificate::from_pem(&pem).map_err(|e| {
                DomainError::DirectoryError(format!("Invalid CA certificate {}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        match (&config.client_cert, &config.client_key) {
            (Some(cert), Some(key)) => {
                let mut pem = read_file(key)?;
                pem.extend_from_slice(&read_file(cert)?);
                let identity = Identity::from_pem(&pem).map_err(|e| {
                    DomainError::DirectoryError(format!("Invalid client certificate: {}", e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(DomainError::DirectoryError(
                    "client_cert and client_key must be set together".into(),
                ))
            }
        }

        let client = builder
            .build()
            .map_err(|e| DomainError::DirectoryError(e.to_string()))?;

        let pods_url = Url::parse_with_params(
            &format!("{}/api/v1/pods", api_server),
            &[("labelSelector", config.label_selector.as_str())],
        )
        .map_err(|e| DomainError::DirectoryError(format!("Invalid API server URL: {}", e)))?;

        Ok(Self {
            client,
            pods_url,
            token_file,
        })
    }

    pub fn pods_url(&self) -> &Url {
        &self.pods_url
    }
}

#[async_trait]
impl EarlyRefreshDirectory for KubernetesPodDirectory {
    async fn list_early_refresh_addresses(&self) -> Result<Vec<IpAddr>, DomainError> {
        let mut request = self.client.get(self.pods_url.clone());
        // Projected service-account tokens rotate, so re-read every time.
        if let Some(path) = &self.token_file {
            let token = tokio::fs::read_to_string(path).await.map_err(|e| {
                DomainError::DirectoryError(format!(
                    "Failed to read token {}: {}",
                    path.display(),
                    e
                ))
            })?;
            request = request.bearer_auth(token.trim());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::DirectoryError(format!("Pod list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::DirectoryError(format!(
                "HTTP {} listing pods",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::DirectoryError(format!("Failed to read pod list: {}", e)))?;

        let addresses = parse_pod_list(&body)?;
        debug!(addresses = addresses.len(), "Pod list fetched");
        Ok(addresses)
    }

    fn name(&self) -> &'static str {
        "kubernetes"
    }
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
struct PodMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatus {
    #[serde(default)]
    pod_ip: Option<String>,
    #[serde(default)]
    pod_ips: Vec<PodIp>,
}

#[derive(Debug, Deserialize)]
struct PodIp {
    ip: String,
}

/// Extract pod addresses from a `PodList` JSON body.
///
/// Pods without an address yet are skipped silently; unparseable
/// addresses are skipped with a warning.
pub fn parse_pod_list(body: &str) -> Result<Vec<IpAddr>, DomainError> {
    let list: PodList = serde_json::from_str(body)
        .map_err(|e| DomainError::DirectoryError(format!("Invalid pod list: {}", e)))?;

    let mut addresses = Vec::new();
    for pod in list.items {
        let raw: Vec<String> = if pod.status.pod_ips.is_empty() {
            pod.status.pod_ip.into_iter().collect()
        } else {
            pod.status.pod_ips.into_iter().map(|p| p.ip).collect()
        };

        for ip in raw {
            match ip.parse::<IpAddr>() {
                Ok(addr) => {
                    if !addresses.contains(&addr) {
                        addresses.push(addr);
                    }
                }
                Err(_) => warn!(
                    pod = %pod.metadata.name,
                    namespace = %pod.metadata.namespace,
                    ip = %ip,
                    "Skipping pod with invalid IP"
                ),
            }
        }
    }
    Ok(addresses)
}

fn in_cluster_api_server() -> Result<String, DomainError> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
        DomainError::DirectoryError(
            "KUBERNETES_SERVICE_HOST not set; configure early_refresh.api_server".into(),
        )
    })?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
        _ => host,
    };
    Ok(format!("https://{}:{}", host, port))
}

fn read_file(path: &str) -> Result<Vec<u8>, DomainError> {
    std::fs::read(path)
        .map_err(|e| DomainError::DirectoryError(format!("Failed to read {}: {}", path, e)))
}
