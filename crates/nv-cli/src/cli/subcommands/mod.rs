mod archive;
mod report;

pub use archive::ArchiveCommands;
pub use report::ReportCommands;
