use anyhow::Context;
use nv_api::{Fetcher, HttpTransport};
use nv_config::NetvaultConfig;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::output::output;
use crate::progress::Progress;

pub async fn handle(
    fetcher: &Fetcher<HttpTransport>,
    config: &NetvaultConfig,
    org_id: &str,
    tag: Option<&str>,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let catalog = bootstrap::load_catalog(config)?;
    let spinner = Progress::spinner(&format!("{org_id}: discovering"));
    let estimate = nv_extract::estimate(
        fetcher,
        &catalog,
        org_id,
        tag,
        config.limits.requests_per_second,
    )
    .await;
    spinner.finish_clear();
    let estimate = estimate.with_context(|| format!("failed to estimate scan of {org_id}"))?;

    for warning in &estimate.warnings {
        tracing::warn!(org_id, warning = %warning, "discovery warning");
    }
    output(&estimate, flags.format)
}
