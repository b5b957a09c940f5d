use super::wire::{decode_message, encode_message, udp_payload_limit};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};
use warmcache_application::ports::DnsResolver;
use warmcache_domain::{DnsMessage, DnsRequest};

/// Turns one query datagram into one reply datagram.
///
/// Resolver errors become SERVFAIL. Replies larger than the client's UDP
/// payload limit are replaced by an empty truncated reply.
pub struct DnsServerHandler {
    resolver: Arc<dyn DnsResolver>,
    server_label: Arc<str>,
}

impl DnsServerHandler {
    pub fn new(resolver: Arc<dyn DnsResolver>, server_label: impl Into<Arc<str>>) -> Self {
        Self {
            resolver,
            server_label: server_label.into(),
        }
    }

    pub fn server_label(&self) -> &str {
        &self.server_label
    }

    /// `None` when nothing should be sent back.
    pub async fn handle_datagram(&self, packet: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
        let query = match decode_message(packet) {
            Ok(query) => query,
            Err(e) => {
                debug!(client = %peer, error = %e, "Dropping malformed query");
                return None;
            }
        };
        if query.flags.response {
            debug!(client = %peer, "Dropping datagram with QR set");
            return None;
        }

        let request = DnsRequest::new(query, peer.ip(), Arc::clone(&self.server_label));
        let response = match self.resolver.resolve(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    client = %peer,
                    domain = ?request.question().map(|q| q.name.as_ref()),
                    error = %e,
                    "Resolution failed, answering SERVFAIL"
                );
                DnsMessage::servfail_for(&request.message)
            }
        };

        let limit = udp_payload_limit(&request.message);
        match encode_message(&response) {
            Ok(bytes) if bytes.len() <= limit => Some(bytes),
            Ok(bytes) => {
                debug!(
                    client = %peer,
                    size = bytes.len(),
                    limit = limit,
                    "Reply exceeds UDP payload limit, truncating"
                );
                self.encode_truncated(&request.message, &response)
            }
            Err(e) => {
                error!(client = %peer, error = %e, "Failed to encode reply");
                encode_message(&DnsMessage::servfail_for(&request.message)).ok()
            }
        }
    }

    fn encode_truncated(&self, query: &DnsMessage, response: &DnsMessage) -> Option<Vec<u8>> {
        let mut truncated = DnsMessage::response_to(query);
        truncated.response_code = response.response_code;
        truncated.flags.authoritative = response.flags.authoritative;
        truncated.flags.recursion_available = response.flags.recursion_available;
        truncated.flags.truncated = true;
        encode_message(&truncated).ok()
    }
}
