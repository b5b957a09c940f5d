use super::RecordType;
use crate::errors::DomainError;

const MAX_POINTER_JUMPS: usize = 64;

/// Half of the 32-bit serial space, used for RFC 1982 comparisons.
const YEAR68: i64 = 1 << 31;

/// Typed view of SOA rdata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl SoaData {
    /// Parse SOA from wire format
    ///
    /// ## Format
    /// - Variable: MNAME (DNS name format)
    /// - Variable: RNAME (DNS name format)
    /// - 5 x 4 bytes: serial, refresh, retry, expire, minimum
    pub fn parse(data: &[u8]) -> Result<Self, DomainError> {
        let (mname, pos) = read_name(data, 0)?;
        let (rname, pos) = read_name(data, pos)?;

        if data.len() < pos + 20 {
            return Err(DomainError::InvalidDnsResponse(
                "SOA record too short".into(),
            ));
        }

        let field = |index: usize| {
            let at = pos + index * 4;
            u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
        };

        Ok(Self {
            mname,
            rname,
            serial: field(0),
            refresh: field(1),
            retry: field(2),
            expire: field(3),
            minimum: field(4),
        })
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = encode_name(&self.mname);
        out.extend_from_slice(&encode_name(&self.rname));
        for value in [
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        ] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out
    }
}

/// Typed view of RRSIG rdata (RFC 4034 §3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrsigData {
    pub type_covered: RecordType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl RrsigData {
    /// Parse RRSIG from wire format
    ///
    /// ## Format (fixed part)
    /// - 2 bytes: type covered
    /// - 1 byte: algorithm
    /// - 1 byte: labels
    /// - 4 bytes: original TTL
    /// - 4 bytes: signature expiration
    /// - 4 bytes: signature inception
    /// - 2 bytes: key tag
    /// - Variable: signer name (DNS name format)
    /// - Variable: signature
    pub fn parse(data: &[u8]) -> Result<Self, DomainError> {
        if data.len() < 18 {
            return Err(DomainError::InvalidDnsResponse(
                "RRSIG record too short".into(),
            ));
        }

        let type_covered = RecordType::from_u16(u16::from_be_bytes([data[0], data[1]]));
        let algorithm = data[2];
        let labels = data[3];
        let original_ttl = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let expiration = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let inception = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
        let key_tag = u16::from_be_bytes([data[16], data[17]]);

        let (signer_name, signature_start) = read_name(data, 18)?;

        Ok(Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature: data[signature_start..].to_vec(),
        })
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18 + self.signer_name.len() + 2 + self.signature.len());
        out.extend_from_slice(&self.type_covered.to_u16().to_be_bytes());
        out.push(self.algorithm);
        out.push(self.labels);
        out.extend_from_slice(&self.original_ttl.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.inception.to_be_bytes());
        out.extend_from_slice(&self.key_tag.to_be_bytes());
        out.extend_from_slice(&encode_name(&self.signer_name));
        out.extend_from_slice(&self.signature);
        out
    }

    /// Whether `unix_secs` falls inside the signature validity period.
    ///
    /// Inception and expiration are 32-bit serial numbers (RFC 1982) and are
    /// shifted by multiples of 2^31 seconds relative to `unix_secs` first.
    pub fn is_valid_at(&self, unix_secs: i64) -> bool {
        let inception = i64::from(self.inception);
        let expiration = i64::from(self.expiration);

        let inception = inception + ((inception - unix_secs) / YEAR68) * YEAR68;
        let expiration = expiration + ((expiration - unix_secs) / YEAR68) * YEAR68;

        inception <= unix_secs && unix_secs <= expiration
    }
}

/// Read a possibly-compressed DNS name starting at `start`.
///
/// Returns the dotted name (always ending in `.`) and the offset of the first
/// byte after the name in `data`.
pub(crate) fn read_name(data: &[u8], start: usize) -> Result<(String, usize), DomainError> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = start;
    let mut end = None;
    let mut jumps = 0;

    loop {
        let len = *data
            .get(pos)
            .ok_or_else(|| DomainError::InvalidDnsResponse("DNS name truncated".into()))?
            as usize;

        if len == 0 {
            pos += 1;
            break;
        }

        if len & 0xC0 == 0xC0 {
            let low = *data
                .get(pos + 1)
                .ok_or_else(|| DomainError::InvalidDnsResponse("DNS pointer truncated".into()))?;
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err(DomainError::InvalidDnsResponse(
                    "DNS name compression loop".into(),
                ));
            }
            if end.is_none() {
                end = Some(pos + 2);
            }
            pos = ((len & 0x3F) << 8) | low as usize;
            continue;
        }

        let label = data
            .get(pos + 1..pos + 1 + len)
            .ok_or_else(|| DomainError::InvalidDnsResponse("DNS label truncated".into()))?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + len;
    }

    let name = if labels.is_empty() {
        ".".to_string()
    } else {
        let mut joined = labels.join(".");
        joined.push('.');
        joined
    };

    Ok((name, end.unwrap_or(pos)))
}

/// Encode a dotted name as uncompressed wire labels.
pub(crate) fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|l| !l.is_empty()) {
        let bytes = label.as_bytes();
        let len = bytes.len().min(63);
        out.push(len as u8);
        out.extend_from_slice(&bytes[..len]);
    }
    out.push(0);
    out
}
