use clap::Subcommand;

/// Commands that read the local archive.
#[derive(Clone, Debug, Subcommand)]
pub enum ReportCommands {
    /// List archived organizations.
    ListOrgs,
    /// List an organization's revisions, newest first.
    ListCommits {
        /// Organization id.
        org_id: String,
        /// Stop after this many revisions.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Compare two revisions and publish the report.
    GetDiff {
        /// Organization id.
        org_id: String,
        /// Older side of the comparison.
        #[arg(default_value = "HEAD~1")]
        revision_a: String,
        /// Newer side of the comparison.
        #[arg(default_value = "HEAD")]
        revision_b: String,
    },
}
