use std::sync::Arc;

use anyhow::Context;
use nv_api::{ClientConfig, FetchOptions, Fetcher, HttpTransport, RateLimiter, RetryPolicy};
use nv_config::NetvaultConfig;
use nv_core::Catalog;

use crate::cli::GlobalFlags;

/// Load `.env`, then the layered configuration.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<NetvaultConfig> {
    NetvaultConfig::load_with_dotenv(flags.config.as_deref())
        .context("failed to load netvault configuration")
}

/// The API fetcher every archive command shares. One limiter per process.
pub fn fetcher(config: &NetvaultConfig) -> anyhow::Result<Arc<Fetcher<HttpTransport>>> {
    let key = config.api_key()?.clone();
    let transport = HttpTransport::new(&ClientConfig::from_config(config, key))
        .context("failed to build the HTTP client")?;
    let limiter = Arc::new(RateLimiter::new(
        config.limits.requests_per_second,
        config.limits.max_in_flight,
    ));
    let options = FetchOptions {
        page_size: config.api.page_size,
        retry: RetryPolicy::from_limits(&config.limits),
    };
    Ok(Arc::new(Fetcher::new(transport, limiter, options)))
}

pub fn load_catalog(config: &NetvaultConfig) -> anyhow::Result<Catalog> {
    let path = &config.archive.catalog_path;
    let catalog = Catalog::load(path)
        .with_context(|| format!("failed to load endpoint catalog {}", path.display()))?;
    if catalog.is_empty() {
        tracing::warn!(path = %path.display(), "endpoint catalog is empty; scans will fetch nothing");
    }
    Ok(catalog)
}
