use crate::dns_record::{RecordType, ResourceRecord, CLASS_IN};
use std::fmt;
use std::sync::Arc;

/// Default EDNS payload size advertised on locally built messages.
pub const DEFAULT_EDNS_PAYLOAD: u16 = 1232;

pub const OPCODE_QUERY: u8 = 0;
pub const OPCODE_STATUS: u8 = 2;
pub const OPCODE_NOTIFY: u8 = 4;
pub const OPCODE_UPDATE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    YXDomain,
    YXRRSet,
    NXRRSet,
    NotAuth,
    NotZone,
    Unknown(u16),
}

impl ResponseCode {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YXDomain,
            7 => ResponseCode::YXRRSet,
            8 => ResponseCode::NXRRSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YXDomain => 6,
            ResponseCode::YXRRSet => 7,
            ResponseCode::NXRRSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::Unknown(value) => *value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::YXDomain => "YXDOMAIN",
            ResponseCode::YXRRSet => "YXRRSET",
            ResponseCode::NXRRSet => "NXRRSET",
            ResponseCode::NotAuth => "NOTAUTH",
            ResponseCode::NotZone => "NOTZONE",
            ResponseCode::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Unknown(value) => write!(f, "RCODE{}", value),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Header bits the cache reads or replays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFlags {
    pub response: bool,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Arc<str>,
    pub qtype: RecordType,
    pub qclass: u16,
}

impl Question {
    pub fn new(name: impl Into<Arc<str>>, qtype: RecordType) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass: CLASS_IN,
        }
    }

    pub fn with_class(mut self, qclass: u16) -> Self {
        self.qclass = qclass;
        self
    }

    /// Names compare case-insensitively; type and class must be equal.
    pub fn matches(&self, other: &Question) -> bool {
        self.qtype == other.qtype
            && self.qclass == other.qclass
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// EDNS(0) parameters carried in the OPT pseudo-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edns {
    pub max_payload: u16,
    pub dnssec_ok: bool,
}

impl Default for Edns {
    fn default() -> Self {
        Self {
            max_payload: DEFAULT_EDNS_PAYLOAD,
            dnssec_ok: false,
        }
    }
}

/// Side-channel data attached to a message; never encoded on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    /// Owner name of the wildcard that synthesized the answer, if any.
    pub wildcard: Option<Arc<str>>,
    pub cache_hit: bool,
    pub served_stale: bool,
}

/// Decoded DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub id: u16,
    pub opcode: u8,
    pub flags: HeaderFlags,
    pub response_code: ResponseCode,
    pub question: Option<Question>,
    pub edns: Option<Edns>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub metadata: MessageMetadata,
}

impl DnsMessage {
    /// Recursive query for a single question.
    pub fn query(id: u16, question: Question) -> Self {
        Self {
            id,
            opcode: OPCODE_QUERY,
            flags: HeaderFlags {
                recursion_desired: true,
                ..HeaderFlags::default()
            },
            response_code: ResponseCode::NoError,
            question: Some(question),
            edns: None,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            metadata: MessageMetadata::default(),
        }
    }

    /// Empty NOERROR response echoing the id, question, RD bit and EDNS of `query`.
    pub fn response_to(query: &DnsMessage) -> Self {
        Self {
            id: query.id,
            opcode: query.opcode,
            flags: HeaderFlags {
                response: true,
                recursion_desired: query.flags.recursion_desired,
                checking_disabled: query.flags.checking_disabled,
                ..HeaderFlags::default()
            },
            response_code: ResponseCode::NoError,
            question: query.question.clone(),
            edns: query.edns,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn servfail_for(query: &DnsMessage) -> Self {
        Self::response_to(query).with_response_code(ResponseCode::ServFail)
    }

    pub fn with_dnssec_ok(mut self) -> Self {
        let mut edns = self.edns.unwrap_or_default();
        edns.dnssec_ok = true;
        self.edns = Some(edns);
        self
    }

    pub fn with_checking_disabled(mut self) -> Self {
        self.flags.checking_disabled = true;
        self
    }

    pub fn with_response_code(mut self, response_code: ResponseCode) -> Self {
        self.response_code = response_code;
        self
    }

    pub fn with_answer(mut self, record: ResourceRecord) -> Self {
        self.answers.push(record);
        self
    }

    pub fn with_authority(mut self, record: ResourceRecord) -> Self {
        self.authority.push(record);
        self
    }

    pub fn with_additional(mut self, record: ResourceRecord) -> Self {
        self.additional.push(record);
        self
    }

    pub fn dnssec_ok(&self) -> bool {
        self.edns.is_some_and(|edns| edns.dnssec_ok)
    }

    /// True when this is a response to exactly `question`.
    pub fn answers_question(&self, question: &Question) -> bool {
        self.flags.response
            && self
                .question
                .as_ref()
                .is_some_and(|asked| asked.matches(question))
    }

    /// All records across the three sections, in wire order.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
    }
}
