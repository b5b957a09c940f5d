use tracing::info;
use warmcache_domain::{CliOverrides, Config};

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;

    info!(
        config_file = config_path.unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        upstreams = config.upstream.servers.len(),
        early_refresh = ?config.early_refresh.source,
        "Configuration loaded"
    );

    Ok(config)
}
