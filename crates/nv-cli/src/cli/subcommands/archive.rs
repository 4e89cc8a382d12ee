use clap::Subcommand;

/// Commands that talk to the dashboard API.
#[derive(Clone, Debug, Subcommand)]
pub enum ArchiveCommands {
    /// List organizations visible to the API key.
    ListOrgs,
    /// Discover and plan a scan without fetching or writing anything.
    EstimateScan {
        /// Organization id.
        org_id: String,
        /// Only networks carrying this tag (and their devices).
        #[arg(long)]
        tag: Option<String>,
    },
    /// Scan organizations and commit their settings.
    GetSettings {
        /// One or more organization ids.
        #[arg(required = true)]
        org_ids: Vec<String>,
        /// Only networks carrying this tag (and their devices).
        #[arg(long)]
        tag: Option<String>,
    },
}
