use super::super::cache::freshness;
use super::super::cache::{
    CacheKey, CacheMetrics, CachePolicy, CacheabilityClassifier, Freshness, Item, ItemClass,
    ItemStore, LateTier, Rejection,
};
use super::super::typify::StandardResponseClassifier;
use crate::system::SystemClock;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};
use warmcache_application::ports::{
    CacheMetricsSink, Clock, DnsResolver, EarlyRefreshSource, ResponseClassifier,
};
use warmcache_application::services::EarlyRefreshRegistry;
use warmcache_domain::{DnsMessage, DnsRequest, DomainError, Question, ResponseCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Negative,
    Positive,
    Late,
}

impl Source {
    fn as_str(&self) -> &'static str {
        match self {
            Source::Negative => "negative",
            Source::Positive => "positive",
            Source::Late => "late",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshReason {
    Prefetch,
    Stale,
}

impl RefreshReason {
    fn as_str(&self) -> &'static str {
        match self {
            RefreshReason::Prefetch => "prefetch",
            RefreshReason::Stale => "stale",
        }
    }
}

struct Hit {
    item: Arc<Item>,
    state: Freshness,
    source: Source,
}

impl Hit {
    fn overdue(&self) -> u64 {
        match self.state {
            Freshness::Stale(overdue) => overdue,
            _ => 0,
        }
    }
}

struct CacheState {
    inner: Arc<dyn DnsResolver>,
    policy: Arc<CachePolicy>,
    classifier: CacheabilityClassifier,
    positive: ItemStore,
    negative: ItemStore,
    late: LateTier,
    early_refresh: Arc<dyn EarlyRefreshSource>,
    metrics: Arc<dyn CacheMetricsSink>,
    clock: Arc<dyn Clock>,
}

/// Cache decorator for DNS resolver
///
/// Wraps another resolver and answers from a positive and a negative store,
/// with optional serve-stale, prefetch, and a late tier fed by early-refresh
/// clients. Cloning shares the stores.
#[derive(Clone)]
pub struct CachedResolver {
    state: Arc<CacheState>,
}

pub struct CachedResolverBuilder {
    inner: Arc<dyn DnsResolver>,
    policy: CachePolicy,
    typifier: Arc<dyn ResponseClassifier>,
    early_refresh: Arc<dyn EarlyRefreshSource>,
    metrics: Arc<dyn CacheMetricsSink>,
    clock: Arc<dyn Clock>,
}

impl CachedResolverBuilder {
    pub fn with_classifier(mut self, typifier: Arc<dyn ResponseClassifier>) -> Self {
        self.typifier = typifier;
        self
    }

    pub fn with_early_refresh(mut self, source: Arc<dyn EarlyRefreshSource>) -> Self {
        self.early_refresh = source;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> CachedResolver {
        let policy = Arc::new(self.policy);

        info!(
            positive_capacity = policy.positive_capacity,
            negative_capacity = policy.negative_capacity,
            serve_stale_secs = policy.stale_window.as_secs(),
            verify_stale = policy.verify_stale,
            prefetch_amount = policy.prefetch.amount,
            late_bonus_secs = policy.late_bonus,
            "Response cache initialized"
        );

        let state = CacheState {
            classifier: CacheabilityClassifier::new(self.typifier, Arc::clone(&policy)),
            positive: ItemStore::new("positive", policy.positive_capacity),
            negative: ItemStore::new("negative", policy.negative_capacity),
            late: LateTier::new(
                policy.positive_capacity,
                policy.late_bonus,
                policy.stale_window,
            ),
            inner: self.inner,
            early_refresh: self.early_refresh,
            metrics: self.metrics,
            clock: self.clock,
            policy,
        };

        CachedResolver {
            state: Arc::new(state),
        }
    }
}

impl CachedResolver {
    pub fn builder(inner: Arc<dyn DnsResolver>, policy: CachePolicy) -> CachedResolverBuilder {
        CachedResolverBuilder {
            inner,
            policy,
            typifier: Arc::new(StandardResponseClassifier::new()),
            early_refresh: Arc::new(EarlyRefreshRegistry::new()),
            metrics: Arc::new(CacheMetrics::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Wrap a resolver with caching, using the system clock and no
    /// early-refresh clients.
    pub fn new(inner: Arc<dyn DnsResolver>, policy: CachePolicy) -> Self {
        Self::builder(inner, policy).build()
    }

    pub fn positive_len(&self) -> usize {
        self.state.positive.len()
    }

    pub fn negative_len(&self) -> usize {
        self.state.negative.len()
    }

    pub fn late_len(&self) -> usize {
        self.state.late.len()
    }

    /// Whether a background refresh for `key` is in flight.
    pub fn is_refreshing(&self, key: CacheKey) -> bool {
        self.state.positive.is_refreshing(key)
    }
}

impl CacheState {
    async fn serve(
        self: &Arc<Self>,
        request: &DnsRequest,
        question: &Question,
    ) -> Result<DnsMessage, DomainError> {
        let now = self.clock.now();
        let key =
            CacheKey::for_question(question, request.dnssec_ok(), request.checking_disabled());
        let early = self.early_refresh.is_early_refresh(request.client);

        self.metrics.record_request(&request.server);

        let Some(hit) = self.lookup(key, question, now, early) else {
            self.metrics.record_miss(&request.server);
            debug!(
                domain = %question.name,
                record_type = %question.qtype,
                early_refresh = early,
                "Cache MISS"
            );
            return self.fetch_and_store(request, key, early).await;
        };

        self.metrics.record_hit(&request.server, hit.item.class.outcome());

        let Freshness::Fresh(remaining) = hit.state else {
            return Ok(self.serve_stale(request, key, early, hit).await);
        };

        debug!(
            domain = %question.name,
            record_type = %question.qtype,
            ttl = remaining,
            source = hit.source.as_str(),
            "Cache HIT"
        );

        if hit.source != Source::Late
            && self
                .policy
                .prefetch
                .should_prefetch(&hit.item, remaining, now)
        {
            self.spawn_refresh(request, key, early, &hit, RefreshReason::Prefetch);
        }

        let ttl = if self.policy.keep_ttl {
            hit.item.orig_ttl
        } else {
            remaining
        };
        Ok(hit.item.to_message(&request.message, ttl))
    }

    async fn serve_stale(
        self: &Arc<Self>,
        request: &DnsRequest,
        key: CacheKey,
        early: bool,
        hit: Hit,
    ) -> DnsMessage {
        if self.policy.verify_stale {
            if let Some(verified) = self.verify_stale(request, key, early).await {
                return verified;
            }
        } else {
            self.spawn_refresh(request, key, early, &hit, RefreshReason::Stale);
        }

        self.metrics.record_served_stale(&request.server);
        debug!(
            domain = %hit.item.name,
            record_type = %hit.item.qtype,
            overdue_secs = hit.overdue(),
            source = hit.source.as_str(),
            "Serving stale answer"
        );

        let ttl = if self.policy.keep_ttl {
            hit.item.orig_ttl
        } else {
            0
        };
        let mut reply = hit.item.to_message(&request.message, ttl);
        reply.metadata.served_stale = true;
        reply
    }

    /// Synchronous upstream check before serving stale. A NOERROR or
    /// NXDOMAIN answer replaces the stale one; anything else, including
    /// failure, means the stale item is served.
    async fn verify_stale(
        &self,
        request: &DnsRequest,
        key: CacheKey,
        early: bool,
    ) -> Option<DnsMessage> {
        match self.inner.resolve(request).await {
            Ok(response)
                if matches!(
                    response.response_code,
                    ResponseCode::NoError | ResponseCode::NXDomain
                ) =>
            {
                self.store(request, key, &response, early, None);
                Some(response)
            }
            Ok(response) => {
                debug!(
                    rcode = %response.response_code,
                    "Stale verification inconclusive"
                );
                None
            }
            Err(e) => {
                debug!(error = %e, "Stale verification failed");
                None
            }
        }
    }

    async fn fetch_and_store(
        &self,
        request: &DnsRequest,
        key: CacheKey,
        early: bool,
    ) -> Result<DnsMessage, DomainError> {
        let response = self.inner.resolve(request).await?;
        self.store(request, key, &response, early, None);
        Ok(response)
    }

    /// At most one background refresh per key; later triggers are dropped
    /// while one is in flight. The slot lives in the positive store whichever
    /// store produced the hit.
    fn spawn_refresh(
        self: &Arc<Self>,
        request: &DnsRequest,
        key: CacheKey,
        early: bool,
        hit: &Hit,
        reason: RefreshReason,
    ) {
        let Some(guard) = self.positive.try_begin_refresh(key) else {
            debug!(
                domain = %hit.item.name,
                reason = reason.as_str(),
                "Refresh already in flight"
            );
            return;
        };

        if reason == RefreshReason::Prefetch {
            self.metrics.record_prefetch(&request.server);
        }

        let state = Arc::clone(self);
        let request = request.clone();
        let hits = hit.item.hits().hits();

        tokio::spawn(async move {
            let _guard = guard;
            match state.inner.resolve(&request).await {
                Ok(response) => {
                    state.store(&request, key, &response, early, Some(hits));
                }
                Err(e) => {
                    debug!(
                        error = %e,
                        reason = reason.as_str(),
                        "Background refresh failed"
                    );
                }
            }
        });
    }

    /// Classify and store an upstream answer. `carried_hits` seeds the hit
    /// window of the new item when it replaces a refreshed one.
    fn store(
        &self,
        request: &DnsRequest,
        key: CacheKey,
        response: &DnsMessage,
        early: bool,
        carried_hits: Option<u32>,
    ) -> bool {
        let Some(question) = request.question() else {
            return false;
        };
        let now = self.clock.now();

        let cacheable = match self.classifier.classify(request, response, now) {
            Ok(cacheable) => cacheable,
            Err(Rejection::QuestionMismatch) => {
                self.metrics.record_drop(&request.server);
                warn!(
                    domain = %question.name,
                    record_type = %question.qtype,
                    "Upstream answer does not match question, not caching"
                );
                return false;
            }
            Err(reason) => {
                debug!(
                    domain = %question.name,
                    record_type = %question.qtype,
                    reason = %reason,
                    "Not caching answer"
                );
                return false;
            }
        };

        let item = Arc::new(Item::from_response(
            response,
            question,
            cacheable.class,
            cacheable.duration,
            now,
        ));
        if let Some(hits) = carried_hits {
            item.hits().reset(now, hits);
        }

        match cacheable.class {
            ItemClass::Success => {
                self.positive.add(key, Arc::clone(&item));
                self.negative.remove(key);
            }
            ItemClass::NameError | ItemClass::NoData => {
                self.negative.add(key, Arc::clone(&item));
                self.positive.remove(key);
                self.late.remove(key);
            }
            ItemClass::Error => self.negative.add(key, Arc::clone(&item)),
        }

        debug!(
            domain = %question.name,
            record_type = %question.qtype,
            kind = %cacheable.kind,
            ttl = cacheable.duration,
            "Cached answer"
        );

        if early {
            self.late.offer(key, &item, now);
        }
        true
    }

    /// Primary stores first; ordinary clients fall back to the late tier
    /// when the primary has nothing fresh. Early-refresh clients never get
    /// a stale positive answer, so they always drive the refresh.
    fn lookup(
        &self,
        key: CacheKey,
        question: &Question,
        now: SystemTime,
        early: bool,
    ) -> Option<Hit> {
        let stale_window = self.policy.stale_window;
        let positive_window = if early { Duration::ZERO } else { stale_window };

        let negative = probe(
            &self.negative,
            Source::Negative,
            key,
            question,
            now,
            stale_window,
        );
        let positive = probe(
            &self.positive,
            Source::Positive,
            key,
            question,
            now,
            positive_window,
        );
        let primary = prefer(negative, positive);

        if early || primary.as_ref().is_some_and(|hit| hit.state.is_fresh()) {
            return primary;
        }

        match self.late.lookup(key, question, now) {
            Some((item, state)) if state.is_fresh() || primary.is_none() => Some(Hit {
                item,
                state,
                source: Source::Late,
            }),
            _ => primary,
        }
    }
}

fn probe(
    store: &ItemStore,
    source: Source,
    key: CacheKey,
    question: &Question,
    now: SystemTime,
    stale_window: Duration,
) -> Option<Hit> {
    let item = store.get(key)?;
    if !item.matches(question) {
        error!(
            domain = %question.name,
            store = store.name(),
            "Cached item does not match question"
        );
        return None;
    }
    let state = freshness::classify(item.ttl_remaining(now), stale_window);
    state.is_usable().then_some(Hit {
        item,
        state,
        source,
    })
}

/// Fresh beats stale. Between two fresh items the negative one wins unless
/// it is a cached server failure; between two stale items the less overdue
/// one wins, negative on ties.
fn prefer(negative: Option<Hit>, positive: Option<Hit>) -> Option<Hit> {
    match (negative, positive) {
        (Some(negative), Some(positive)) => {
            let negative_wins = match (negative.state, positive.state) {
                (Freshness::Fresh(_), Freshness::Fresh(_)) => {
                    negative.item.class != ItemClass::Error
                }
                (Freshness::Fresh(_), _) => true,
                (_, Freshness::Fresh(_)) => false,
                (Freshness::Stale(neg), Freshness::Stale(pos)) => neg <= pos,
                _ => true,
            };
            Some(if negative_wins { negative } else { positive })
        }
        (negative, positive) => negative.or(positive),
    }
}

#[async_trait]
impl DnsResolver for CachedResolver {
    async fn resolve(&self, request: &DnsRequest) -> Result<DnsMessage, DomainError> {
        let Some(question) = request.question() else {
            return self.state.inner.resolve(request).await;
        };
        let question = question.clone();
        self.state.serve(request, &question).await
    }
}
