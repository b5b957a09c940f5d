use crate::dns_message::{DnsMessage, Question};
use std::net::IpAddr;
use std::sync::Arc;

/// A query together with where it came from.
///
/// `server` labels the listener that received the query and is only used
/// for metrics.
#[derive(Debug, Clone)]
pub struct DnsRequest {
    pub message: DnsMessage,
    pub client: IpAddr,
    pub server: Arc<str>,
}

impl DnsRequest {
    pub fn new(message: DnsMessage, client: IpAddr, server: impl Into<Arc<str>>) -> Self {
        Self {
            message,
            client,
            server: server.into(),
        }
    }

    pub fn question(&self) -> Option<&Question> {
        self.message.question.as_ref()
    }

    pub fn dnssec_ok(&self) -> bool {
        self.message.dnssec_ok()
    }

    pub fn checking_disabled(&self) -> bool {
        self.message.flags.checking_disabled
    }
}
