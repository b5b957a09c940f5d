use std::fmt;

/// Semantic classification of a DNS response.
///
/// Produced by a `ResponseClassifier`; the cache only stores the first five
/// kinds and treats the rest as uncacheable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// NOERROR with at least one answer record.
    NoError,
    /// NXDOMAIN backed by an SOA in the authority section.
    NameError,
    /// NOERROR, empty answer, SOA in the authority section.
    NoData,
    /// NOERROR referral carrying NS records in the authority section.
    Delegation,
    /// SERVFAIL or NOTIMP.
    ServerError,
    /// Any other response code, or a negative answer without an SOA.
    OtherError,
    /// Zone transfer traffic (AXFR/IXFR).
    Meta,
    /// Dynamic update traffic.
    Update,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::NoError => "NOERROR",
            ResponseKind::NameError => "NXDOMAIN",
            ResponseKind::NoData => "NODATA",
            ResponseKind::Delegation => "DELEGATION",
            ResponseKind::ServerError => "SERVERERROR",
            ResponseKind::OtherError => "OTHERERROR",
            ResponseKind::Meta => "META",
            ResponseKind::Update => "UPDATE",
        }
    }

    /// Negative kinds draw their TTL from the negative bounds.
    pub fn is_negative(&self) -> bool {
        matches!(self, ResponseKind::NameError | ResponseKind::NoData)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
