mod estimate_scan;
mod get_settings;
mod list_orgs;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::ArchiveCommands;
use nv_config::NetvaultConfig;

/// Handle `nvault archive`.
pub async fn handle(
    action: &ArchiveCommands,
    config: &NetvaultConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let fetcher = bootstrap::fetcher(config)?;
    match action {
        ArchiveCommands::ListOrgs => list_orgs::handle(&fetcher, flags).await,
        ArchiveCommands::EstimateScan { org_id, tag } => {
            estimate_scan::handle(&fetcher, config, org_id, tag.as_deref(), flags).await
        }
        ArchiveCommands::GetSettings { org_ids, tag } => {
            get_settings::handle(fetcher, config, org_ids, tag.as_deref(), flags).await
        }
    }
}
