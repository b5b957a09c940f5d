//! Warmcache Domain Layer
pub mod config;
pub mod dns_message;
pub mod dns_record;
pub mod dns_request;
pub mod errors;
pub mod response_kind;

pub use config::{
    parse_upstream_address, CacheConfig, CliOverrides, Config, ConfigError, EarlyRefreshConfig,
    EarlyRefreshSourceKind, LoggingConfig, ServerConfig, UpstreamConfig,
};
pub use dns_message::{
    DnsMessage, Edns, HeaderFlags, MessageMetadata, Question, ResponseCode, OPCODE_NOTIFY,
    OPCODE_QUERY, OPCODE_STATUS, OPCODE_UPDATE,
};
pub use dns_record::{RecordType, ResourceRecord, RrsigData, SoaData, CLASS_IN};
pub use dns_request::DnsRequest;
pub use errors::DomainError;
pub use response_kind::ResponseKind;
