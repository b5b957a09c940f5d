use std::time::{Duration, SystemTime};
use warmcache_domain::{DnsMessage, RecordType, ResponseKind};

/// TTL used when a response carries nothing to derive one from.
pub const MINIMAL_DEFAULT_TTL: u32 = 5;

/// Upper bound of the derived message TTL, before any configured ceiling.
pub const MAXIMUM_DEFAULT_TTL: u32 = 3600;

/// State of a cached item at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Seconds of validity left.
    Fresh(u32),
    /// Seconds past expiry, still inside the stale window.
    Stale(u64),
    Rotten,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, Freshness::Rotten)
    }
}

/// `orig_ttl` minus whole seconds elapsed since `stored_at`.
///
/// A clock that moved backwards yields more than `orig_ttl`.
pub fn ttl_remaining(orig_ttl: u32, stored_at: SystemTime, now: SystemTime) -> i64 {
    let elapsed = match now.duration_since(stored_at) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(ahead) => -(ahead.duration().as_secs() as i64),
    };
    i64::from(orig_ttl) - elapsed
}

/// An item is stale while it is less than `stale_window` seconds overdue.
pub fn classify(remaining: i64, stale_window: Duration) -> Freshness {
    if remaining > 0 {
        return Freshness::Fresh(remaining.min(i64::from(u32::MAX)) as u32);
    }
    let overdue = remaining.unsigned_abs();
    if overdue < stale_window.as_secs() {
        Freshness::Stale(overdue)
    } else {
        Freshness::Rotten
    }
}

/// Floor first, then ceiling: a ceiling of zero always wins.
pub fn compute_ttl(message_ttl: u32, min_ttl: u32, max_ttl: u32) -> u32 {
    let mut ttl = message_ttl;
    if ttl < min_ttl {
        ttl = min_ttl;
    }
    if ttl > max_ttl {
        ttl = max_ttl;
    }
    ttl
}

/// Smallest TTL across the message, capped at [`MAXIMUM_DEFAULT_TTL`].
///
/// OPT pseudo-records are ignored. For negative answers an SOA in the
/// authority section contributes its MINIMUM field as well as its own TTL.
/// Kinds other than NOERROR, NXDOMAIN and NODATA, and messages with no
/// answer or authority records, get [`MINIMAL_DEFAULT_TTL`].
pub fn minimal_ttl(message: &DnsMessage, kind: ResponseKind) -> u32 {
    if !matches!(
        kind,
        ResponseKind::NoError | ResponseKind::NameError | ResponseKind::NoData
    ) {
        return MINIMAL_DEFAULT_TTL;
    }
    if message.answers.is_empty() && message.authority.is_empty() {
        return MINIMAL_DEFAULT_TTL;
    }

    let mut min_ttl = MAXIMUM_DEFAULT_TTL;
    for record in &message.answers {
        min_ttl = min_ttl.min(record.ttl);
    }
    for record in &message.authority {
        min_ttl = min_ttl.min(record.ttl);
        if kind.is_negative() {
            if let Some(soa) = record.as_soa() {
                min_ttl = min_ttl.min(soa.minimum);
            }
        }
    }
    for record in &message.additional {
        if record.record_type == RecordType::OPT {
            continue;
        }
        min_ttl = min_ttl.min(record.ttl);
    }
    min_ttl
}
