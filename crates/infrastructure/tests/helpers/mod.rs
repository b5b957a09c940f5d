#![allow(dead_code)]
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use warmcache_application::ports::{DnsResolver, ResponseClassifier};
use warmcache_application::services::EarlyRefreshRegistry;
use warmcache_domain::{
    CacheConfig, DnsMessage, DnsRequest, DomainError, Question, RecordType, ResourceRecord,
    ResponseCode, ResponseKind, RrsigData, SoaData,
};
use warmcache_infrastructure::dns::cache::{CacheMetrics, CachePolicy};
use warmcache_infrastructure::dns::CachedResolver;
use warmcache_infrastructure::system::ManualClock;

pub const SERVER: &str = "dns://:53";

type Responder = Arc<dyn Fn(&DnsRequest) -> Result<DnsMessage, DomainError> + Send + Sync>;

/// Upstream double: answers through a swappable closure and counts calls.
pub struct MockUpstream {
    responder: Mutex<Responder>,
    calls: AtomicUsize,
    seen: Mutex<Vec<DnsRequest>>,
}

impl MockUpstream {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&DnsRequest) -> Result<DnsMessage, DomainError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Mutex::new(Arc::new(responder)),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Answers every A query with `address` at `ttl`.
    pub fn answering(address: Ipv4Addr, ttl: u32) -> Arc<Self> {
        Self::new(move |request| Ok(a_response(&request.message, address, ttl)))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(|_| Err(DomainError::QueryTimeout))
    }

    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&DnsRequest) -> Result<DnsMessage, DomainError> + Send + Sync + 'static,
    {
        *self.responder.lock().unwrap() = Arc::new(responder);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<DnsRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsResolver for MockUpstream {
    async fn resolve(&self, request: &DnsRequest) -> Result<DnsMessage, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        let responder = Arc::clone(&*self.responder.lock().unwrap());
        responder(request)
    }
}

/// Classifier double returning one kind for everything.
pub struct FixedKindClassifier(pub ResponseKind);

impl ResponseClassifier for FixedKindClassifier {
    fn typify(&self, _response: &DnsMessage, _now: SystemTime) -> ResponseKind {
        self.0
    }
}

/// Resolver under test plus the handles tests poke at.
pub struct Harness {
    pub cache: CachedResolver,
    pub upstream: Arc<MockUpstream>,
    pub clock: Arc<ManualClock>,
    pub metrics: Arc<CacheMetrics>,
    pub registry: Arc<EarlyRefreshRegistry>,
}

impl Harness {
    pub fn new(upstream: Arc<MockUpstream>, config: CacheConfig) -> Self {
        let clock = Arc::new(ManualClock::fixed());
        let metrics = Arc::new(CacheMetrics::new());
        let registry = Arc::new(EarlyRefreshRegistry::new());
        let cache = CachedResolver::builder(upstream.clone(), CachePolicy::from_config(&config))
            .with_clock(clock.clone())
            .with_metrics(metrics.clone())
            .with_early_refresh(registry.clone())
            .build();
        Self {
            cache,
            upstream,
            clock,
            metrics,
            registry,
        }
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    pub async fn ask(&self, name: &str, qtype: RecordType) -> DnsMessage {
        self.ask_from(name, qtype, client()).await
    }

    pub async fn ask_from(&self, name: &str, qtype: RecordType, from: IpAddr) -> DnsMessage {
        self.cache
            .resolve(&request_from(query(name, qtype), from))
            .await
            .unwrap()
    }

    pub async fn send(&self, message: DnsMessage) -> DnsMessage {
        self.cache.resolve(&request(message)).await.unwrap()
    }
}

/// Let spawned refresh tasks run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

pub fn client() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 100))
}

pub fn probe_client() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))
}

pub fn query(name: &str, qtype: RecordType) -> DnsMessage {
    DnsMessage::query(fastrand::u16(..), Question::new(name, qtype))
}

pub fn request(message: DnsMessage) -> DnsRequest {
    request_from(message, client())
}

pub fn request_from(message: DnsMessage, from: IpAddr) -> DnsRequest {
    DnsRequest::new(message, from, SERVER)
}

pub fn a_response(query: &DnsMessage, address: Ipv4Addr, ttl: u32) -> DnsMessage {
    let name = query
        .question
        .as_ref()
        .map(|q| q.name.to_string())
        .unwrap_or_default();
    let mut response =
        DnsMessage::response_to(query).with_answer(ResourceRecord::a(name, ttl, address));
    response.flags.recursion_available = true;
    response
}

pub fn soa(zone: &str, ttl: u32, minimum: u32) -> ResourceRecord {
    ResourceRecord::soa(
        zone,
        ttl,
        &SoaData {
            mname: format!("ns.{}", zone),
            rname: format!("hostmaster.{}", zone),
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 1_209_600,
            minimum,
        },
    )
}

pub fn nxdomain_response(query: &DnsMessage, zone: &str, ttl: u32) -> DnsMessage {
    DnsMessage::response_to(query)
        .with_response_code(ResponseCode::NXDomain)
        .with_authority(soa(zone, ttl, ttl))
}

pub fn rrsig(name: &str, inception: u32, expiration: u32) -> ResourceRecord {
    ResourceRecord::rrsig(
        name,
        300,
        &RrsigData {
            type_covered: RecordType::A,
            algorithm: 13,
            labels: 2,
            original_ttl: 300,
            expiration,
            inception,
            key_tag: 12345,
            signer_name: "example.org.".to_string(),
            signature: vec![0xAB; 64],
        },
    )
}

pub fn unix_secs(clock: &ManualClock) -> u32 {
    use warmcache_application::ports::Clock;
    clock
        .now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as u32
}

pub fn first_ip(message: &DnsMessage) -> Option<IpAddr> {
    message.answers.first().and_then(|r| r.as_ip())
}

pub fn first_ttl(message: &DnsMessage) -> Option<u32> {
    message.records().next().map(|r| r.ttl)
}

pub fn config() -> CacheConfig {
    CacheConfig::default()
}
