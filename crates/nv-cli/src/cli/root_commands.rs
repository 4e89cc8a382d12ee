use clap::{Args, Subcommand, ValueEnum};

use crate::cli::subcommands::{ArchiveCommands, ReportCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Pull configuration from the dashboard API into the archive.
    Archive {
        #[command(subcommand)]
        action: ArchiveCommands,
    },
    /// Inspect the archive and publish change reports.
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
    /// Print the JSON Schema of a file format.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Which format to describe.
    #[arg(value_enum)]
    pub kind: SchemaKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaKind {
    /// The endpoint catalog file.
    Catalog,
    /// One scan-log record.
    ScanRecord,
}
