use super::rdata::{encode_name, read_name};
use super::{RecordType, RrsigData, SoaData};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// DNS class IN.
pub const CLASS_IN: u16 = 1;

/// A resource record as carried in a message section.
///
/// Rdata is kept as opaque wire bytes; typed views are parsed on demand.
/// Cloning is cheap (`Arc` for name and rdata), which matters because the
/// cache replays the same records with a rewritten TTL on every hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub dns_class: u16,
    pub ttl: u32,
    pub rdata: Arc<[u8]>,
}

impl ResourceRecord {
    pub fn new(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        dns_class: u16,
        ttl: u32,
        rdata: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            dns_class,
            ttl,
            rdata: rdata.into(),
        }
    }

    pub fn a(name: impl Into<Arc<str>>, ttl: u32, address: Ipv4Addr) -> Self {
        Self::new(name, RecordType::A, CLASS_IN, ttl, address.octets().to_vec())
    }

    pub fn aaaa(name: impl Into<Arc<str>>, ttl: u32, address: Ipv6Addr) -> Self {
        Self::new(name, RecordType::AAAA, CLASS_IN, ttl, address.octets().to_vec())
    }

    pub fn cname(name: impl Into<Arc<str>>, ttl: u32, target: &str) -> Self {
        Self::new(name, RecordType::CNAME, CLASS_IN, ttl, encode_name(target))
    }

    pub fn ns(name: impl Into<Arc<str>>, ttl: u32, host: &str) -> Self {
        Self::new(name, RecordType::NS, CLASS_IN, ttl, encode_name(host))
    }

    pub fn soa(name: impl Into<Arc<str>>, ttl: u32, soa: &SoaData) -> Self {
        Self::new(name, RecordType::SOA, CLASS_IN, ttl, soa.to_wire())
    }

    pub fn rrsig(name: impl Into<Arc<str>>, ttl: u32, sig: &RrsigData) -> Self {
        Self::new(name, RecordType::RRSIG, CLASS_IN, ttl, sig.to_wire())
    }

    /// Same record with a different TTL; rdata is shared, not copied.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            name: Arc::clone(&self.name),
            record_type: self.record_type,
            dns_class: self.dns_class,
            ttl,
            rdata: Arc::clone(&self.rdata),
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        match self.record_type {
            RecordType::A => {
                let octets = <[u8; 4]>::try_from(&self.rdata[..]).ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            RecordType::AAAA => {
                let octets = <[u8; 16]>::try_from(&self.rdata[..]).ok()?;
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => None,
        }
    }

    /// Target name of CNAME, NS and PTR records.
    pub fn as_target(&self) -> Option<String> {
        match self.record_type {
            RecordType::CNAME | RecordType::NS | RecordType::PTR => {
                read_name(&self.rdata, 0).ok().map(|(name, _)| name)
            }
            _ => None,
        }
    }

    pub fn as_soa(&self) -> Option<SoaData> {
        if self.record_type != RecordType::SOA {
            return None;
        }
        SoaData::parse(&self.rdata).ok()
    }

    pub fn as_rrsig(&self) -> Option<RrsigData> {
        if self.record_type != RecordType::RRSIG {
            return None;
        }
        RrsigData::parse(&self.rdata).ok()
    }
}
