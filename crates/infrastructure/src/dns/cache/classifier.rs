use super::freshness::minimal_ttl;
use super::item::ItemClass;
use super::policy::CachePolicy;
use crate::dns::typify::has_expired_signature;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;
use warmcache_application::ports::ResponseClassifier;
use warmcache_domain::{DnsMessage, DnsRequest, ResponseKind};

/// Why an upstream answer was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoQuestion,
    /// The answer is not for the question that was asked.
    QuestionMismatch,
    Truncated,
    /// DO was set and an RRSIG is outside its validity window.
    ExpiredSignature,
    Uncacheable(ResponseKind),
    /// The name falls in a configured exception zone.
    Excepted(ResponseKind),
    /// The configured bounds reduced the TTL to zero.
    ZeroTtl(ResponseKind),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoQuestion => f.write_str("no question"),
            Rejection::QuestionMismatch => f.write_str("answer does not match question"),
            Rejection::Truncated => f.write_str("truncated"),
            Rejection::ExpiredSignature => f.write_str("expired signature"),
            Rejection::Uncacheable(kind) => write!(f, "uncacheable kind {}", kind),
            Rejection::Excepted(kind) => write!(f, "{} in exception zone", kind),
            Rejection::ZeroTtl(kind) => write!(f, "{} with zero ttl", kind),
        }
    }
}

/// An answer that may be stored, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cacheable {
    pub kind: ResponseKind,
    pub class: ItemClass,
    /// Seconds, after the configured bounds.
    pub duration: u32,
}

/// Decides whether an upstream answer goes into the cache.
pub struct CacheabilityClassifier {
    typifier: Arc<dyn ResponseClassifier>,
    policy: Arc<CachePolicy>,
}

impl CacheabilityClassifier {
    pub fn new(typifier: Arc<dyn ResponseClassifier>, policy: Arc<CachePolicy>) -> Self {
        Self { typifier, policy }
    }

    pub fn classify(
        &self,
        request: &DnsRequest,
        response: &DnsMessage,
        now: SystemTime,
    ) -> Result<Cacheable, Rejection> {
        let question = request.question().ok_or(Rejection::NoQuestion)?;
        if !response.answers_question(question) {
            return Err(Rejection::QuestionMismatch);
        }
        if response.flags.truncated {
            return Err(Rejection::Truncated);
        }
        if request.dnssec_ok() && has_expired_signature(response, now) {
            return Err(Rejection::ExpiredSignature);
        }

        let kind = self.typifier.typify(response, now);
        let class = ItemClass::from_kind(kind).ok_or(Rejection::Uncacheable(kind))?;

        if let Some(zone) = self
            .policy
            .exceptions_for(class.is_positive())
            .matches(&question.name)
        {
            debug!(
                domain = %question.name,
                zone = %zone,
                kind = %kind,
                "Not caching answer from exception zone"
            );
            return Err(Rejection::Excepted(kind));
        }

        let duration = self
            .policy
            .duration_for(kind, minimal_ttl(response, kind));
        if duration == 0 {
            return Err(Rejection::ZeroTtl(kind));
        }

        Ok(Cacheable {
            kind,
            class,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::typify::StandardResponseClassifier;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::{Duration, UNIX_EPOCH};
    use warmcache_domain::{
        CacheConfig, Question, RecordType, ResourceRecord, ResponseCode, RrsigData, SoaData,
    };

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn classifier(config: CacheConfig) -> CacheabilityClassifier {
        CacheabilityClassifier::new(
            Arc::new(StandardResponseClassifier::new()),
            Arc::new(CachePolicy::from_config(&config)),
        )
    }

    fn request(name: &str) -> DnsRequest {
        DnsRequest::new(
            DnsMessage::query(1, Question::new(name, RecordType::A)),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "dns://:53",
        )
    }

    fn answer_for(request: &DnsRequest, ttl: u32) -> DnsMessage {
        let name = request
            .question()
            .map(|q| q.name.to_string())
            .unwrap_or_default();
        DnsMessage::response_to(&request.message).with_answer(ResourceRecord::a(
            name,
            ttl,
            Ipv4Addr::new(127, 0, 0, 1),
        ))
    }

    fn soa() -> ResourceRecord {
        ResourceRecord::soa(
            "example.org.",
            3600,
            &SoaData {
                mname: "ns.example.org.".into(),
                rname: "hostmaster.example.org.".into(),
                serial: 1,
                refresh: 7200,
                retry: 3600,
                expire: 1_209_600,
                minimum: 300,
            },
        )
    }

    // ============================================================================
    // Accepted answers
    // ============================================================================

    #[test]
    fn test_positive_answer_is_cacheable() {
        let req = request("example.org.");
        let result =
            classifier(CacheConfig::default()).classify(&req, &answer_for(&req, 300), now());

        assert_eq!(
            result,
            Ok(Cacheable {
                kind: ResponseKind::NoError,
                class: ItemClass::Success,
                duration: 300,
            })
        );
    }

    #[test]
    fn test_nxdomain_with_soa_is_negative() {
        let req = request("missing.example.org.");
        let response = DnsMessage::response_to(&req.message)
            .with_response_code(ResponseCode::NXDomain)
            .with_authority(soa());

        let result = classifier(CacheConfig::default()).classify(&req, &response, now());

        assert_eq!(result.map(|c| c.class), Ok(ItemClass::NameError));
    }

    // ============================================================================
    // Rejected answers
    // ============================================================================

    #[test]
    fn test_truncated_answer_is_rejected() {
        let req = request("example.org.");
        let mut response = answer_for(&req, 300);
        response.flags.truncated = true;

        let result = classifier(CacheConfig::default()).classify(&req, &response, now());

        assert_eq!(result, Err(Rejection::Truncated));
    }

    #[test]
    fn test_mismatched_answer_is_rejected() {
        let req = request("example.org.");
        let other = request("example.net.");

        let result =
            classifier(CacheConfig::default()).classify(&req, &answer_for(&other, 300), now());

        assert_eq!(result, Err(Rejection::QuestionMismatch));
    }

    #[test]
    fn test_expired_signature_rejected_only_for_do_requests() {
        let plain = request("example.org.");
        let mut with_do = plain.clone();
        with_do.message = with_do.message.with_dnssec_ok();
        let sig = ResourceRecord::rrsig(
            "example.org.",
            300,
            &RrsigData {
                type_covered: RecordType::A,
                algorithm: 8,
                labels: 2,
                original_ttl: 300,
                expiration: 1_600_000_000,
                inception: 1_500_000_000,
                key_tag: 1,
                signer_name: "example.org.".into(),
                signature: vec![1, 2, 3],
            },
        );
        let classifier = classifier(CacheConfig::default());

        let response = answer_for(&plain, 300).with_answer(sig.clone());
        assert!(classifier.classify(&plain, &response, now()).is_ok());

        let mut response = answer_for(&with_do, 300).with_answer(sig);
        response.edns = None;
        assert_eq!(
            classifier.classify(&with_do, &response, now()),
            Err(Rejection::ExpiredSignature)
        );
    }

    #[test]
    fn test_other_errors_are_uncacheable() {
        let req = request("example.org.");
        let response =
            DnsMessage::response_to(&req.message).with_response_code(ResponseCode::Refused);

        let result = classifier(CacheConfig::default()).classify(&req, &response, now());

        assert_eq!(result, Err(Rejection::Uncacheable(ResponseKind::OtherError)));
    }

    #[test]
    fn test_exception_zones_by_polarity() {
        let config = CacheConfig {
            positive_exceptions: vec!["example.org.".to_string()],
            ..CacheConfig::default()
        };
        let classifier = classifier(config);
        let req = request("www.example.org.");

        assert_eq!(
            classifier.classify(&req, &answer_for(&req, 300), now()),
            Err(Rejection::Excepted(ResponseKind::NoError))
        );

        let negative = DnsMessage::response_to(&req.message)
            .with_response_code(ResponseCode::NXDomain)
            .with_authority(soa());
        assert!(classifier.classify(&req, &negative, now()).is_ok());
    }

    #[test]
    fn test_zero_servfail_ceiling_is_rejected() {
        let config = CacheConfig {
            servfail_max_ttl: 0,
            ..CacheConfig::default()
        };
        let req = request("example.org.");
        let response = DnsMessage::servfail_for(&req.message);

        let result = classifier(config).classify(&req, &response, now());

        assert_eq!(result, Err(Rejection::ZeroTtl(ResponseKind::ServerError)));
    }
}
