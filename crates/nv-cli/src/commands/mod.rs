pub mod archive;
pub mod report;
pub mod schema;
