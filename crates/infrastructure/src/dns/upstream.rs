use super::wire::{decode_message, encode_message};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};
use warmcache_application::ports::DnsResolver;
use warmcache_domain::{
    parse_upstream_address, DnsMessage, DnsRequest, DomainError, UpstreamConfig,
};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Plain DNS over UDP to a fixed list of servers, tried in order.
///
/// Each attempt uses a fresh ephemeral socket and a random message id;
/// replies with another id are ignored until the per-server timeout.
pub struct UdpUpstreamResolver {
    servers: Vec<SocketAddr>,
    timeout: Duration,
}

impl UdpUpstreamResolver {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Result<Self, DomainError> {
        if servers.is_empty() {
            return Err(DomainError::NoUpstreamServers);
        }
        Ok(Self { servers, timeout })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, DomainError> {
        let servers = config
            .servers
            .iter()
            .map(|server| {
                parse_upstream_address(server).ok_or_else(|| {
                    DomainError::InvalidIpAddress(format!("Invalid upstream server: {}", server))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(servers, Duration::from_millis(config.query_timeout_ms))
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    async fn exchange(
        &self,
        server: SocketAddr,
        message_bytes: &[u8],
        id: u16,
    ) -> Result<DnsMessage, DomainError> {
        // Bind to ephemeral port (0 = OS assigns)
        let bind_addr = if server.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;
        socket.connect(server).await.map_err(|e| {
            DomainError::UpstreamUnreachable(format!("Failed to connect to {}: {}", server, e))
        })?;

        let deadline = Instant::now() + self.timeout;
        tokio::time::timeout_at(deadline, socket.send(message_bytes))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
            .map_err(|e| {
                DomainError::UpstreamUnreachable(format!(
                    "Failed to send UDP query to {}: {}",
                    server, e
                ))
            })?;

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let bytes_received = tokio::time::timeout_at(deadline, socket.recv(&mut recv_buf))
                .await
                .map_err(|_| DomainError::QueryTimeout)?
                .map_err(|e| {
                    DomainError::UpstreamUnreachable(format!(
                        "Failed to receive UDP response from {}: {}",
                        server, e
                    ))
                })?;

            let response = match decode_message(&recv_buf[..bytes_received]) {
                Ok(response) => response,
                Err(e) => {
                    debug!(server = %server, error = %e, "Discarding undecodable UDP response");
                    continue;
                }
            };
            if response.id != id || !response.flags.response {
                warn!(
                    server = %server,
                    expected_id = id,
                    received_id = response.id,
                    "Discarding UDP response with unexpected id"
                );
                continue;
            }

            debug!(
                server = %server,
                bytes_received = bytes_received,
                rcode = %response.response_code,
                "UDP response received"
            );
            return Ok(response);
        }
    }
}

#[async_trait]
impl DnsResolver for UdpUpstreamResolver {
    async fn resolve(&self, request: &DnsRequest) -> Result<DnsMessage, DomainError> {
        let id = fastrand::u16(..);
        let mut query = request.message.clone();
        query.id = id;
        query.flags.response = false;
        query.answers.clear();
        query.authority.clear();
        query.additional.clear();
        let message_bytes = encode_message(&query)?;

        let mut last_error = DomainError::NoUpstreamServers;
        for &server in &self.servers {
            match self.exchange(server, &message_bytes, id).await {
                Ok(mut response) => {
                    response.id = request.message.id;
                    return Ok(response);
                }
                Err(e) => {
                    warn!(server = %server, error = %e, "Upstream query failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
