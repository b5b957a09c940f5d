use std::time::{SystemTime, UNIX_EPOCH};
use warmcache_application::ports::ResponseClassifier;
use warmcache_domain::{
    DnsMessage, RecordType, ResponseCode, ResponseKind, OPCODE_NOTIFY, OPCODE_UPDATE,
};

/// Response taxonomy used by the cache.
///
/// Checked in order: update and notify traffic, zone transfers, expired
/// signatures (only when the message itself sets DO), then the rcode and
/// section shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResponseClassifier;

impl StandardResponseClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseClassifier for StandardResponseClassifier {
    fn typify(&self, response: &DnsMessage, now: SystemTime) -> ResponseKind {
        if response.opcode == OPCODE_UPDATE {
            return ResponseKind::Update;
        }
        if response.opcode == OPCODE_NOTIFY {
            return ResponseKind::Meta;
        }
        if response
            .question
            .as_ref()
            .is_some_and(|question| question.qtype.is_zone_transfer())
        {
            return ResponseKind::Meta;
        }
        if response.dnssec_ok() && has_expired_signature(response, now) {
            return ResponseKind::OtherError;
        }

        let rcode = response.response_code;
        if !response.answers.is_empty() && rcode == ResponseCode::NoError {
            return ResponseKind::NoError;
        }

        let mut soa = false;
        let mut delegations = 0usize;
        for record in &response.authority {
            match record.record_type {
                RecordType::SOA => soa = true,
                RecordType::NS => delegations += 1,
                _ => {}
            }
        }

        match rcode {
            ResponseCode::NoError if soa => ResponseKind::NoData,
            ResponseCode::NXDomain if soa => ResponseKind::NameError,
            ResponseCode::ServFail | ResponseCode::NotImp => ResponseKind::ServerError,
            ResponseCode::NoError if delegations > 0 => ResponseKind::Delegation,
            ResponseCode::NoError => ResponseKind::NoError,
            _ => ResponseKind::OtherError,
        }
    }
}

/// True when any RRSIG in any section is outside its validity window at `now`.
///
/// RRSIGs that fail to parse count as expired.
pub fn has_expired_signature(message: &DnsMessage, now: SystemTime) -> bool {
    let now_secs = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0);

    message
        .records()
        .filter(|record| record.record_type == RecordType::RRSIG)
        .any(|record| match record.as_rrsig() {
            Some(sig) => !sig.is_valid_at(now_secs),
            None => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use warmcache_domain::{Question, ResourceRecord, RrsigData, SoaData};

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn response(qtype: RecordType) -> DnsMessage {
        DnsMessage::response_to(&DnsMessage::query(1, Question::new("example.org.", qtype)))
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
                minimum: 60,
            },
        )
    }

    fn rrsig(inception: u32, expiration: u32) -> ResourceRecord {
        ResourceRecord::rrsig(
            "example.org.",
            3600,
            &RrsigData {
                type_covered: RecordType::A,
                algorithm: 8,
                labels: 2,
                original_ttl: 3600,
                expiration,
                inception,
                key_tag: 12051,
                signer_name: "example.org.".into(),
                signature: vec![0xAB; 32],
            },
        )
    }

    #[test]
    fn test_typify_positive_and_negative() {
        let classifier = StandardResponseClassifier::new();

        let answer = response(RecordType::A)
            .with_answer(ResourceRecord::a("example.org.", 300, Ipv4Addr::LOCALHOST));
        assert_eq!(classifier.typify(&answer, now()), ResponseKind::NoError);

        let nodata = response(RecordType::A).with_authority(soa());
        assert_eq!(classifier.typify(&nodata, now()), ResponseKind::NoData);

        let nxdomain = response(RecordType::A)
            .with_response_code(ResponseCode::NXDomain)
            .with_authority(soa());
        assert_eq!(classifier.typify(&nxdomain, now()), ResponseKind::NameError);
    }

    #[test]
    fn test_typify_errors_and_delegation() {
        let classifier = StandardResponseClassifier::new();

        let servfail = response(RecordType::A).with_response_code(ResponseCode::ServFail);
        assert_eq!(classifier.typify(&servfail, now()), ResponseKind::ServerError);

        let notimp = response(RecordType::A).with_response_code(ResponseCode::NotImp);
        assert_eq!(classifier.typify(&notimp, now()), ResponseKind::ServerError);

        let refused = response(RecordType::A).with_response_code(ResponseCode::Refused);
        assert_eq!(classifier.typify(&refused, now()), ResponseKind::OtherError);

        let bare_nxdomain = response(RecordType::A).with_response_code(ResponseCode::NXDomain);
        assert_eq!(classifier.typify(&bare_nxdomain, now()), ResponseKind::OtherError);

        let referral = response(RecordType::A)
            .with_authority(ResourceRecord::ns("example.org.", 300, "ns.example.org."));
        assert_eq!(classifier.typify(&referral, now()), ResponseKind::Delegation);
    }

    #[test]
    fn test_typify_transfers_and_updates() {
        let classifier = StandardResponseClassifier::new();

        assert_eq!(
            classifier.typify(&response(RecordType::AXFR), now()),
            ResponseKind::Meta
        );
        assert_eq!(
            classifier.typify(&response(RecordType::IXFR), now()),
            ResponseKind::Meta
        );

        let mut update = response(RecordType::SOA);
        update.opcode = OPCODE_UPDATE;
        assert_eq!(classifier.typify(&update, now()), ResponseKind::Update);
    }

    #[test]
    fn test_expired_signature_detection() {
        let now_secs = 1_700_000_000u32;
        let valid = response(RecordType::A).with_answer(rrsig(now_secs - 10, now_secs + 10));
        let expired = response(RecordType::A).with_answer(rrsig(now_secs - 20, now_secs - 10));

        assert!(!has_expired_signature(&valid, now()));
        assert!(has_expired_signature(&expired, now()));
    }

    #[test]
    fn test_expired_signature_only_matters_with_do() {
        let classifier = StandardResponseClassifier::new();
        let now_secs = 1_700_000_000u32;
        let plain = response(RecordType::A)
            .with_answer(ResourceRecord::a("example.org.", 300, Ipv4Addr::LOCALHOST))
            .with_answer(rrsig(now_secs - 20, now_secs - 10));
        let with_do = plain.clone().with_dnssec_ok();

        assert_eq!(classifier.typify(&plain, now()), ResponseKind::NoError);
        assert_eq!(classifier.typify(&with_do, now()), ResponseKind::OtherError);
    }
}
