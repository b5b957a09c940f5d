use super::EarlyRefreshServices;
use std::sync::Arc;
use tracing::info;
use warmcache_domain::Config;
use warmcache_infrastructure::dns::{
    CacheMetrics, CachePolicy, CachedResolver, DnsServerHandler, UdpUpstreamResolver,
};

pub struct DnsServices {
    pub cache: Arc<CachedResolver>,
    pub metrics: Arc<CacheMetrics>,
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config, early_refresh: &EarlyRefreshServices) -> anyhow::Result<Self> {
        let upstream = Arc::new(UdpUpstreamResolver::from_config(&config.upstream)?);
        info!(servers = ?upstream.servers(), "Upstream resolvers configured");

        let metrics = Arc::new(CacheMetrics::new());
        let policy = CachePolicy::from_config(&config.cache);

        let mut builder =
            CachedResolver::builder(upstream, policy).with_metrics(metrics.clone());
        if early_refresh.is_enabled() {
            builder = builder.with_early_refresh(early_refresh.registry.clone());
        }
        let cache = Arc::new(builder.build());

        info!(
            positive_capacity = config.cache.positive_capacity,
            negative_capacity = config.cache.negative_capacity,
            serve_stale_secs = config.cache.serve_stale_secs,
            prefetch_amount = config.cache.prefetch_amount,
            "DNS cache initialized"
        );

        let handler = DnsServerHandler::new(cache.clone(), config.server.metrics_label());

        Ok(Self {
            cache,
            metrics,
            handler,
        })
    }
}
