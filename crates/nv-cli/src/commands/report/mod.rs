mod get_diff;
mod list_commits;
mod list_orgs;

use nv_config::NetvaultConfig;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReportCommands;

/// Handle `nvault report`. These commands only read the local archive.
pub async fn handle(
    action: &ReportCommands,
    config: &NetvaultConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ReportCommands::ListOrgs => list_orgs::handle(config, flags),
        ReportCommands::ListCommits { org_id, limit } => {
            list_commits::handle(config, org_id, *limit, flags)
        }
        ReportCommands::GetDiff {
            org_id,
            revision_a,
            revision_b,
        } => get_diff::handle(config, org_id, revision_a, revision_b, flags).await,
    }
}
