use hickory_proto::op::{
    Edns as WireEdns, Message, MessageType, OpCode, Query, ResponseCode as WireResponseCode,
};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType as WireRecordType};
use hickory_proto::serialize::binary::{BinDecoder, BinEncodable, Restrict};
use std::str::FromStr;
use std::sync::Arc;
use warmcache_domain::{
    DnsMessage, DomainError, Edns, HeaderFlags, MessageMetadata, Question, RecordType,
    ResourceRecord, ResponseCode, OPCODE_NOTIFY, OPCODE_QUERY, OPCODE_STATUS, OPCODE_UPDATE,
};

/// Smallest payload a DNS/UDP client must accept.
pub const MIN_UDP_PAYLOAD: usize = 512;

/// Parse a wire-format message.
///
/// Rdata is kept as the wire bytes hickory emits for it, uncompressed.
pub fn decode_message(bytes: &[u8]) -> Result<DnsMessage, DomainError> {
    let message = Message::from_vec(bytes).map_err(|e| {
        DomainError::InvalidDnsMessage(format!("Failed to parse DNS message: {}", e))
    })?;

    let flags = HeaderFlags {
        response: message.message_type() == MessageType::Response,
        authoritative: message.authoritative(),
        truncated: message.truncated(),
        recursion_desired: message.recursion_desired(),
        recursion_available: message.recursion_available(),
        authentic_data: message.authentic_data(),
        checking_disabled: message.checking_disabled(),
    };

    let question = message.queries().first().map(|query| Question {
        name: Arc::from(query.name().to_utf8()),
        qtype: RecordType::from_u16(u16::from(query.query_type())),
        qclass: u16::from(query.query_class()),
    });

    let edns = message.extensions().as_ref().map(|edns| Edns {
        max_payload: edns.max_payload(),
        dnssec_ok: edns.dnssec_ok(),
    });

    Ok(DnsMessage {
        id: message.id(),
        opcode: u8::from(message.op_code()),
        flags,
        response_code: ResponseCode::from_u16(u16::from(message.response_code())),
        question,
        edns,
        answers: records_from_wire(message.answers())?,
        authority: records_from_wire(message.name_servers())?,
        additional: records_from_wire(message.additionals())?,
        metadata: MessageMetadata::default(),
    })
}

/// Serialize a message. OPT records in the additional section are skipped;
/// EDNS is emitted from `message.edns`.
pub fn encode_message(message: &DnsMessage) -> Result<Vec<u8>, DomainError> {
    let mut wire = Message::new();
    wire.set_id(message.id)
        .set_message_type(if message.flags.response {
            MessageType::Response
        } else {
            MessageType::Query
        })
        .set_op_code(op_code_to_wire(message.opcode))
        .set_authoritative(message.flags.authoritative)
        .set_truncated(message.flags.truncated)
        .set_recursion_desired(message.flags.recursion_desired)
        .set_recursion_available(message.flags.recursion_available)
        .set_authentic_data(message.flags.authentic_data)
        .set_checking_disabled(message.flags.checking_disabled)
        .set_response_code(response_code_to_wire(message.response_code));

    if let Some(question) = &message.question {
        let mut query = Query::query(
            parse_name(&question.name)?,
            WireRecordType::from(question.qtype.to_u16()),
        );
        query.set_query_class(class_to_wire(question.qclass));
        wire.add_query(query);
    }

    for record in &message.answers {
        wire.add_answer(record_to_wire(record)?);
    }
    for record in &message.authority {
        wire.add_name_server(record_to_wire(record)?);
    }
    for record in &message.additional {
        if record.record_type == RecordType::OPT {
            continue;
        }
        wire.add_additional(record_to_wire(record)?);
    }

    if let Some(edns) = message.edns {
        let mut wire_edns = WireEdns::new();
        wire_edns.set_max_payload(edns.max_payload.max(MIN_UDP_PAYLOAD as u16));
        wire_edns.set_dnssec_ok(edns.dnssec_ok);
        wire.set_edns(wire_edns);
    }

    wire.to_vec().map_err(|e| {
        DomainError::InvalidDnsMessage(format!("Failed to encode DNS message: {}", e))
    })
}

/// Largest reply `query` can take over UDP.
pub fn udp_payload_limit(query: &DnsMessage) -> usize {
    query
        .edns
        .map(|edns| usize::from(edns.max_payload).max(MIN_UDP_PAYLOAD))
        .unwrap_or(MIN_UDP_PAYLOAD)
}

fn records_from_wire(records: &[Record]) -> Result<Vec<ResourceRecord>, DomainError> {
    records.iter().map(record_from_wire).collect()
}

fn record_from_wire(record: &Record) -> Result<ResourceRecord, DomainError> {
    let data: Option<&RData> = record.data().into();
    let rdata = match data {
        Some(data) => data.to_bytes().map_err(|e| {
            DomainError::InvalidDnsMessage(format!("Failed to encode rdata: {}", e))
        })?,
        None => Vec::new(),
    };

    Ok(ResourceRecord::new(
        record.name().to_utf8(),
        RecordType::from_u16(u16::from(record.record_type())),
        u16::from(record.dns_class()),
        record.ttl(),
        rdata,
    ))
}

fn record_to_wire(record: &ResourceRecord) -> Result<Record, DomainError> {
    let record_type = WireRecordType::from(record.record_type.to_u16());
    let length = u16::try_from(record.rdata.len())
        .map_err(|_| DomainError::InvalidDnsMessage("rdata exceeds 65535 bytes".into()))?;

    let mut decoder = BinDecoder::new(&record.rdata);
    let rdata = RData::read(&mut decoder, record_type, Restrict::new(length)).map_err(|e| {
        DomainError::InvalidDnsMessage(format!(
            "Invalid {} rdata for {}: {}",
            record.record_type, record.name, e
        ))
    })?;

    let mut wire = Record::from_rdata(parse_name(&record.name)?, record.ttl, rdata);
    wire.set_dns_class(class_to_wire(record.dns_class));
    Ok(wire)
}

fn parse_name(name: &str) -> Result<Name, DomainError> {
    Name::from_str(name).map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", name, e)))
}

fn class_to_wire(class: u16) -> DNSClass {
    match class {
        3 => DNSClass::CH,
        4 => DNSClass::HS,
        254 => DNSClass::NONE,
        255 => DNSClass::ANY,
        _ => DNSClass::IN,
    }
}

fn op_code_to_wire(opcode: u8) -> OpCode {
    match opcode {
        OPCODE_STATUS => OpCode::Status,
        OPCODE_NOTIFY => OpCode::Notify,
        OPCODE_UPDATE => OpCode::Update,
        OPCODE_QUERY => OpCode::Query,
        _ => OpCode::Query,
    }
}

fn response_code_to_wire(code: ResponseCode) -> WireResponseCode {
    match code {
        ResponseCode::NoError => WireResponseCode::NoError,
        ResponseCode::FormErr => WireResponseCode::FormErr,
        ResponseCode::ServFail => WireResponseCode::ServFail,
        ResponseCode::NXDomain => WireResponseCode::NXDomain,
        ResponseCode::NotImp => WireResponseCode::NotImp,
        ResponseCode::Refused => WireResponseCode::Refused,
        ResponseCode::YXDomain => WireResponseCode::YXDomain,
        ResponseCode::YXRRSet => WireResponseCode::YXRRSet,
        ResponseCode::NXRRSet => WireResponseCode::NXRRSet,
        ResponseCode::NotAuth => WireResponseCode::NotAuth,
        ResponseCode::NotZone => WireResponseCode::NotZone,
        ResponseCode::Unknown(value) => WireResponseCode::Unknown(value),
    }
}
