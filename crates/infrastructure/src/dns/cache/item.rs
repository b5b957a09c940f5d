use super::freshness;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use warmcache_application::ports::HitOutcome;
use warmcache_domain::{
    DnsMessage, Question, RecordType, ResourceRecord, ResponseCode, ResponseKind,
};

/// Storage class of a cached answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    /// NOERROR with answers, or a delegation.
    Success,
    NameError,
    NoData,
    /// SERVFAIL / NOTIMP.
    Error,
}

impl ItemClass {
    /// `None` for kinds that are never cached.
    pub fn from_kind(kind: ResponseKind) -> Option<Self> {
        match kind {
            ResponseKind::NoError | ResponseKind::Delegation => Some(ItemClass::Success),
            ResponseKind::NameError => Some(ItemClass::NameError),
            ResponseKind::NoData => Some(ItemClass::NoData),
            ResponseKind::ServerError => Some(ItemClass::Error),
            ResponseKind::OtherError | ResponseKind::Meta | ResponseKind::Update => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, ItemClass::Success)
    }

    pub fn outcome(&self) -> HitOutcome {
        if self.is_positive() {
            HitOutcome::Success
        } else {
            HitOutcome::Denial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemClass::Success => "success",
            ItemClass::NameError => "nxdomain",
            ItemClass::NoData => "nodata",
            ItemClass::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HitState {
    hits: u32,
    last: SystemTime,
}

/// Sliding hit counter used to decide prefetching.
///
/// Hits older than the window are forgotten: the first hit after a quiet
/// period restarts the count at one.
#[derive(Debug)]
pub struct HitWindow {
    state: Mutex<HitState>,
}

impl HitWindow {
    pub fn new(now: SystemTime) -> Self {
        Self {
            state: Mutex::new(HitState { hits: 0, last: now }),
        }
    }

    /// Count a hit at `now` and return the hits inside `window`.
    pub fn record(&self, window: Duration, now: SystemTime) -> u32 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match now.checked_sub(window) {
            Some(earliest) => state.last < earliest,
            None => false,
        };
        if expired {
            state.hits = 1;
        } else {
            state.hits = state.hits.saturating_add(1);
        }
        state.last = now;
        state.hits
    }

    pub fn hits(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .hits
    }

    /// Restart the window at `now` keeping `hits`.
    pub fn reset(&self, now: SystemTime, hits: u32) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.hits = hits;
        state.last = now;
    }
}

/// A cached answer: the sections of the upstream response plus the header
/// bits needed to replay it.
///
/// Items are immutable once stored except for the hit window. TTLs inside
/// the records are ignored on replay; the rendered TTL is derived from
/// `orig_ttl` and `stored_at`.
#[derive(Debug)]
pub struct Item {
    pub name: Arc<str>,
    pub qtype: RecordType,
    pub qclass: u16,
    pub class: ItemClass,
    pub response_code: ResponseCode,
    pub authentic_data: bool,
    pub recursion_available: bool,
    pub checking_disabled: bool,
    pub answers: Arc<[ResourceRecord]>,
    pub authority: Arc<[ResourceRecord]>,
    pub additional: Arc<[ResourceRecord]>,
    pub wildcard: Option<Arc<str>>,
    pub orig_ttl: u32,
    pub stored_at: SystemTime,
    hits: HitWindow,
}

impl Item {
    pub fn from_response(
        response: &DnsMessage,
        question: &Question,
        class: ItemClass,
        duration: u32,
        now: SystemTime,
    ) -> Self {
        Self {
            name: Arc::clone(&question.name),
            qtype: question.qtype,
            qclass: question.qclass,
            class,
            response_code: response.response_code,
            authentic_data: response.flags.authentic_data,
            recursion_available: response.flags.recursion_available,
            checking_disabled: response.flags.checking_disabled,
            answers: response.answers.iter().cloned().collect(),
            authority: response.authority.iter().cloned().collect(),
            additional: response
                .additional
                .iter()
                .filter(|record| record.record_type != RecordType::OPT)
                .cloned()
                .collect(),
            wildcard: response.metadata.wildcard.clone(),
            orig_ttl: duration,
            stored_at: now,
            hits: HitWindow::new(now),
        }
    }

    /// Copy for the late tier: same records, TTL extended by `bonus`,
    /// stored at `now`.
    pub fn late_copy(&self, bonus: u32, now: SystemTime) -> Self {
        Self {
            name: Arc::clone(&self.name),
            qtype: self.qtype,
            qclass: self.qclass,
            class: self.class,
            response_code: self.response_code,
            authentic_data: self.authentic_data,
            recursion_available: self.recursion_available,
            checking_disabled: self.checking_disabled,
            answers: Arc::clone(&self.answers),
            authority: Arc::clone(&self.authority),
            additional: Arc::clone(&self.additional),
            wildcard: self.wildcard.clone(),
            orig_ttl: self.orig_ttl.saturating_add(bonus),
            stored_at: now,
            hits: HitWindow::new(now),
        }
    }

    pub fn hits(&self) -> &HitWindow {
        &self.hits
    }

    /// Whole seconds of validity left at `now`; negative once expired.
    pub fn ttl_remaining(&self, now: SystemTime) -> i64 {
        freshness::ttl_remaining(self.orig_ttl, self.stored_at, now)
    }

    /// Guards against key collisions: the stored question must be the asked one.
    pub fn matches(&self, question: &Question) -> bool {
        self.qtype == question.qtype
            && self.qclass == question.qclass
            && self.name.eq_ignore_ascii_case(&question.name)
    }

    /// Render a reply to `query` with every record's TTL set to `ttl`.
    ///
    /// The reply is always authoritative. AD survives only when the query
    /// set DO or AD itself.
    pub fn to_message(&self, query: &DnsMessage, ttl: u32) -> DnsMessage {
        let mut message = DnsMessage::response_to(query);
        message.response_code = self.response_code;
        message.flags.authoritative = true;
        message.flags.authentic_data =
            self.authentic_data && (query.dnssec_ok() || query.flags.authentic_data);
        message.flags.recursion_available = self.recursion_available;
        message.flags.checking_disabled = self.checking_disabled;
        message.answers = self.answers.iter().map(|r| r.with_ttl(ttl)).collect();
        message.authority = self.authority.iter().map(|r| r.with_ttl(ttl)).collect();
        message.additional = self.additional.iter().map(|r| r.with_ttl(ttl)).collect();
        message.metadata.wildcard = self.wildcard.clone();
        message.metadata.cache_hit = true;
        message
    }
}
