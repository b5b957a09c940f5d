mod helpers;

use helpers::*;
use std::net::{IpAddr, Ipv4Addr};
use warmcache_domain::{CacheConfig, DnsMessage, RecordType, ResponseCode};
use warmcache_infrastructure::dns::CacheKey;

const OLD: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
const NEW: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 2);

fn stale_config(verify: bool) -> CacheConfig {
    CacheConfig {
        serve_stale_secs: 60,
        verify_stale: verify,
        ..config()
    }
}

fn ip(addr: Ipv4Addr) -> Option<IpAddr> {
    Some(IpAddr::V4(addr))
}

// ============================================================================
// Serve stale, background refresh
// ============================================================================

#[tokio::test]
async fn test_expired_item_served_stale_then_refreshed() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(false));
    h.ask("stale.example.org.", RecordType::A).await;
    h.upstream
        .respond_with(|request| Ok(a_response(&request.message, NEW, 10)));

    h.advance(20);
    let stale = h.ask("stale.example.org.", RecordType::A).await;

    assert!(stale.metadata.served_stale);
    assert_eq!(first_ttl(&stale), Some(0));
    assert_eq!(first_ip(&stale), ip(OLD));
    assert_eq!(h.metrics.snapshot(SERVER).served_stale, 1);

    settle().await;
    assert_eq!(h.upstream.calls(), 2);

    let fresh = h.ask("stale.example.org.", RecordType::A).await;
    assert!(!fresh.metadata.served_stale);
    assert_eq!(first_ip(&fresh), ip(NEW));
    assert_eq!(first_ttl(&fresh), Some(10));
}

#[tokio::test]
async fn test_item_past_stale_window_is_a_miss() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(false));
    h.ask("rotten.example.org.", RecordType::A).await;

    // 10 s TTL + 60 s window: 71 s later the item is 61 s overdue.
    h.advance(71);
    let reply = h.ask("rotten.example.org.", RecordType::A).await;

    assert!(!reply.metadata.served_stale);
    assert!(!reply.metadata.cache_hit);
    assert_eq!(h.upstream.calls(), 2);
    assert_eq!(h.metrics.snapshot(SERVER).misses, 2);
}

#[tokio::test]
async fn test_stale_window_zero_never_serves_stale() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), config());
    h.ask("strict.example.org.", RecordType::A).await;

    h.advance(11);
    let reply = h.ask("strict.example.org.", RecordType::A).await;

    assert!(!reply.metadata.cache_hit);
    assert_eq!(h.upstream.calls(), 2);
}

#[tokio::test]
async fn test_stale_survives_failing_refresh() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(false));
    h.ask("outage.example.org.", RecordType::A).await;
    h.upstream.respond_with(|_| Err(warmcache_domain::DomainError::QueryTimeout));

    h.advance(30);
    h.ask("outage.example.org.", RecordType::A).await;
    settle().await;

    h.advance(10);
    let reply = h.ask("outage.example.org.", RecordType::A).await;

    assert!(reply.metadata.served_stale);
    assert_eq!(first_ip(&reply), ip(OLD));
    assert_eq!(h.cache.positive_len(), 1);
}

#[tokio::test]
async fn test_concurrent_stale_hits_refresh_once() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(false));
    h.ask("dedup.example.org.", RecordType::A).await;
    let key = CacheKey::new("dedup.example.org.", RecordType::A, false, false);

    h.advance(20);
    h.ask("dedup.example.org.", RecordType::A).await;
    h.ask("dedup.example.org.", RecordType::A).await;
    h.ask("dedup.example.org.", RecordType::A).await;
    assert!(h.cache.is_refreshing(key));

    settle().await;

    assert!(!h.cache.is_refreshing(key));
    assert_eq!(h.upstream.calls(), 2);
}

// ============================================================================
// Negative polarity
// ============================================================================

#[tokio::test]
async fn test_stale_negative_hit_shares_refresh_slot() {
    let upstream = MockUpstream::new(|request| {
        Ok(nxdomain_response(&request.message, "example.org.", 10))
    });
    let h = Harness::new(upstream, stale_config(false));
    h.ask("gone.example.org.", RecordType::A).await;
    let key = CacheKey::new("gone.example.org.", RecordType::A, false, false);

    h.advance(20);
    h.ask("gone.example.org.", RecordType::A).await;
    h.ask("gone.example.org.", RecordType::A).await;
    assert!(h.cache.is_refreshing(key));

    settle().await;

    assert!(!h.cache.is_refreshing(key));
    assert_eq!(h.upstream.calls(), 2);
}

#[tokio::test]
async fn test_stale_nxdomain_replaced_by_positive_refresh() {
    let upstream = MockUpstream::new(|request| {
        Ok(nxdomain_response(&request.message, "example.org.", 10))
    });
    let h = Harness::new(upstream, stale_config(false));
    h.ask("new.example.org.", RecordType::A).await;
    assert_eq!(h.cache.negative_len(), 1);

    h.upstream
        .respond_with(|request| Ok(a_response(&request.message, NEW, 300)));
    h.advance(20);
    let stale = h.ask("new.example.org.", RecordType::A).await;
    assert_eq!(stale.response_code, ResponseCode::NXDomain);
    assert!(stale.metadata.served_stale);

    settle().await;

    let fresh = h.ask("new.example.org.", RecordType::A).await;
    assert_eq!(fresh.response_code, ResponseCode::NoError);
    assert_eq!(first_ip(&fresh), ip(NEW));
    assert_eq!(h.cache.negative_len(), 0);
    assert_eq!(h.cache.positive_len(), 1);
}

#[tokio::test]
async fn test_fresh_nxdomain_masks_stale_positive() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(false));
    h.ask("removed.example.org.", RecordType::A).await;

    h.upstream
        .respond_with(|request| Ok(nxdomain_response(&request.message, "example.org.", 300)));
    h.advance(20);
    h.ask("removed.example.org.", RecordType::A).await;
    settle().await;

    let reply = h.ask("removed.example.org.", RecordType::A).await;

    assert_eq!(reply.response_code, ResponseCode::NXDomain);
    assert!(!reply.metadata.served_stale);
    assert_eq!(h.cache.positive_len(), 0);
}

// ============================================================================
// Verify stale
// ============================================================================

#[tokio::test]
async fn test_verify_stale_returns_upstream_answer() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(true));
    h.ask("verify.example.org.", RecordType::A).await;
    h.upstream
        .respond_with(|request| Ok(a_response(&request.message, NEW, 10)));

    h.advance(20);
    let reply = h.ask("verify.example.org.", RecordType::A).await;

    assert_eq!(h.upstream.calls(), 2);
    assert!(!reply.metadata.served_stale);
    assert_eq!(first_ip(&reply), ip(NEW));

    let cached = h.ask("verify.example.org.", RecordType::A).await;
    assert!(cached.metadata.cache_hit);
    assert_eq!(first_ip(&cached), ip(NEW));
    assert_eq!(h.upstream.calls(), 2);
}

#[tokio::test]
async fn test_verify_stale_falls_back_on_error() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(true));
    h.ask("verify.example.org.", RecordType::A).await;
    h.upstream.respond_with(|_| Err(warmcache_domain::DomainError::QueryTimeout));

    h.advance(20);
    let reply = h.ask("verify.example.org.", RecordType::A).await;

    assert!(reply.metadata.served_stale);
    assert_eq!(first_ip(&reply), ip(OLD));
    assert_eq!(first_ttl(&reply), Some(0));
    settle().await;
    assert_eq!(h.upstream.calls(), 2);
}

#[tokio::test]
async fn test_verify_stale_ignores_servfail() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(true));
    h.ask("verify.example.org.", RecordType::A).await;
    h.upstream
        .respond_with(|request| Ok(DnsMessage::servfail_for(&request.message)));

    h.advance(20);
    let reply = h.ask("verify.example.org.", RecordType::A).await;

    assert_eq!(reply.response_code, ResponseCode::NoError);
    assert!(reply.metadata.served_stale);
    assert_eq!(h.cache.negative_len(), 0);
}

#[tokio::test]
async fn test_verify_stale_nxdomain_overrides_positive() {
    let h = Harness::new(MockUpstream::answering(OLD, 10), stale_config(true));
    h.ask("verify.example.org.", RecordType::A).await;
    h.upstream
        .respond_with(|request| Ok(nxdomain_response(&request.message, "example.org.", 300)));

    h.advance(20);
    let reply = h.ask("verify.example.org.", RecordType::A).await;
    assert_eq!(reply.response_code, ResponseCode::NXDomain);

    let cached = h.ask("verify.example.org.", RecordType::A).await;
    assert_eq!(cached.response_code, ResponseCode::NXDomain);
    assert_eq!(h.cache.positive_len(), 0);
    assert_eq!(h.upstream.calls(), 2);
}

// ============================================================================
// Keep TTL
// ============================================================================

#[tokio::test]
async fn test_keep_ttl_replays_original_ttl() {
    let config = CacheConfig {
        keep_ttl: true,
        serve_stale_secs: 60,
        ..config()
    };
    let h = Harness::new(MockUpstream::answering(OLD, 300), config);
    h.ask("keep.example.org.", RecordType::A).await;

    h.advance(100);
    let fresh = h.ask("keep.example.org.", RecordType::A).await;
    assert_eq!(first_ttl(&fresh), Some(300));

    h.advance(250);
    let stale = h.ask("keep.example.org.", RecordType::A).await;
    assert!(stale.metadata.served_stale);
    assert_eq!(first_ttl(&stale), Some(300));
}

#[tokio::test]
async fn test_keep_ttl_uses_clamped_value() {
    let config = CacheConfig {
        keep_ttl: true,
        positive_max_ttl: 60,
        ..config()
    };
    let h = Harness::new(MockUpstream::answering(OLD, 300), config);
    h.ask("keep.example.org.", RecordType::A).await;

    h.advance(10);
    let reply = h.ask("keep.example.org.", RecordType::A).await;

    assert_eq!(first_ttl(&reply), Some(60));
}
