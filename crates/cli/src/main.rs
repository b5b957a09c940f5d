//! # Warmcache
//!
//! Caching DNS forwarder with serve-stale, prefetch and an early-refresh tier

mod bootstrap;
mod di;
mod server;

use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use warmcache_domain::CliOverrides;
use warmcache_jobs::{EarlyRefreshSyncJob, JobRunner};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "warmcache")]
#[command(version)]
#[command(about = "Caching DNS forwarder with an early-refresh tier")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'p', long = "port")]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver (repeatable), e.g. 10.96.0.10:53
    #[arg(short = 'u', long = "upstream")]
    upstream: Vec<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dns_port: self.dns_port,
            bind_address: self.bind.clone(),
            upstream_servers: (!self.upstream.is_empty()).then(|| self.upstream.clone()),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Warmcache starting");

    let early_refresh = di::EarlyRefreshServices::new(&config)?;
    let dns = di::DnsServices::new(&config, &early_refresh)?;
    let shutdown = CancellationToken::new();

    let mut jobs = JobRunner::new();
    if let Some(sync) = &early_refresh.sync {
        jobs = jobs.with_early_refresh_sync(
            EarlyRefreshSyncJob::new(Arc::clone(sync))
                .with_interval(early_refresh.sync_interval_secs)
                .with_cancellation(shutdown.clone()),
        );
    }
    jobs.start().await;

    let result = tokio::select! {
        result = server::start_dns_server(config.server.listen_address(), dns.handler) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };
    shutdown.cancel();

    let label = config.server.metrics_label();
    let counters = dns.metrics.snapshot(&label);
    info!(
        requests = counters.requests,
        hits = counters.hits(),
        misses = counters.misses,
        prefetches = counters.prefetches,
        positive_entries = dns.cache.positive_len(),
        negative_entries = dns.cache.negative_len(),
        late_entries = dns.cache.late_len(),
        "Cache statistics"
    );

    if let Err(e) = &result {
        error!(error = %e, "DNS server stopped");
    }
    result
}
