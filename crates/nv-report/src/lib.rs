//! # nv-report
//!
//! Static HTML for change-sets: [`reserve_stamp`] claims a report name,
//! [`render_as`] builds the pages in memory and [`publish`] writes them under
//! the web root and updates the per-organization index. [`publish_scans`]
//! refreshes the organization's scan history page after a scan.

mod error;
mod html;
mod publish;
mod render;
mod scans;

pub use error::ReportError;
pub use html::{STYLE, escape};
pub use publish::{Published, org_dir, publish, reserve_stamp};
pub use render::{DetailPage, Report, ReportMeta, render, render_as};
pub use scans::{RECENT_SCANS, SCANS_FILE, ScanSummary, publish_scans, render_scans_page};
