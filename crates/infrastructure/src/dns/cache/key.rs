use rustc_hash::FxHasher;
use std::fmt;
use std::hash::Hasher;
use warmcache_domain::{DnsRequest, Question, RecordType};

/// 64-bit fingerprint of (lower-cased qname, qtype, DO, CD).
///
/// Class is not part of the key; the stored question is compared on every
/// hit, so a collision or a class mismatch degrades to a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(name: &str, qtype: RecordType, dnssec_ok: bool, checking_disabled: bool) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write_u8(u8::from(dnssec_ok));
        hasher.write_u8(u8::from(checking_disabled));
        hasher.write_u16(qtype.to_u16());
        for byte in name.bytes() {
            hasher.write_u8(byte.to_ascii_lowercase());
        }
        Self(hasher.finish())
    }

    pub fn for_question(question: &Question, dnssec_ok: bool, checking_disabled: bool) -> Self {
        Self::new(&question.name, question.qtype, dnssec_ok, checking_disabled)
    }

    /// `None` when the request carries no question.
    pub fn for_request(request: &DnsRequest) -> Option<Self> {
        request.question().map(|question| {
            Self::for_question(question, request.dnssec_ok(), request.checking_disabled())
        })
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_name_case() {
        assert_eq!(
            CacheKey::new("Example.ORG.", RecordType::A, false, false),
            CacheKey::new("example.org.", RecordType::A, false, false)
        );
    }

    #[test]
    fn test_key_separates_type_and_bits() {
        let base = CacheKey::new("example.org.", RecordType::A, false, false);

        assert_ne!(base, CacheKey::new("example.org.", RecordType::AAAA, false, false));
        assert_ne!(base, CacheKey::new("example.org.", RecordType::A, true, false));
        assert_ne!(base, CacheKey::new("example.org.", RecordType::A, false, true));
        assert_ne!(base, CacheKey::new("example.net.", RecordType::A, false, false));
    }

    #[test]
    fn test_key_is_stable() {
        let first = CacheKey::new("example.org.", RecordType::MX, true, true);
        let second = CacheKey::new("example.org.", RecordType::MX, true, true);
        assert_eq!(first.as_u64(), second.as_u64());
    }
}
