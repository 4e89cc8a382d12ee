//! The per-organization scans page, `orgs/<org_id>/scans.html`.
//!
//! Rewritten in full after every scan that was not aborted: last scan time,
//! what the scan saw, and the most recent revisions of the archive.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use nv_core::{Revision, ScanRecord};

use crate::error::ReportError;
use crate::html::{escape, page};
use crate::publish::{INDEX_FILE, org_dir};

pub const SCANS_FILE: &str = "scans.html";

/// Revisions listed on the scans page.
pub const RECENT_SCANS: usize = 10;

/// Inputs for the scans page.
#[derive(Debug, Clone, Copy)]
pub struct ScanSummary<'a> {
    pub record: &'a ScanRecord,
    /// Resource files in the archive after the scan.
    pub settings: usize,
    /// Newest first; only the first [`RECENT_SCANS`] are shown.
    pub recent: &'a [Revision],
}

#[must_use]
pub fn render_scans_page(summary: &ScanSummary<'_>) -> String {
    let record = summary.record;
    let name = record.org_name.as_deref().unwrap_or(&record.org_id);
    let title = format!("{name} ({}): scans", record.org_id);

    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape(&title));
    let _ = writeln!(
        body,
        "<p class=\"meta\">Last scan {} ({}). <a href=\"{INDEX_FILE}\">Change reports</a></p>",
        record.finished_at.format("%A, %B %d, %Y at %H:%M:%S UTC"),
        record.status,
    );
    body.push_str("<table>\n<tr><th>Organization</th><th>Networks</th><th>Devices</th><th>Settings</th></tr>\n");
    let _ = writeln!(
        body,
        "<tr><td>{}<br>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&record.org_id),
        escape(name),
        record.networks,
        record.devices,
        summary.settings,
    );
    body.push_str("</table>\n");

    body.push_str("<h2>Recent scans</h2>\n");
    if summary.recent.is_empty() {
        body.push_str("<p>No revisions yet.</p>\n");
        return page(&title, &body);
    }
    body.push_str("<table>\n<tr><th>Revision</th><th>Time</th><th>Message</th></tr>\n");
    for revision in summary.recent.iter().take(RECENT_SCANS) {
        let _ = writeln!(
            body,
            "<tr><td><code>{}</code></td><td>{}</td><td>{}</td></tr>",
            escape(revision.short_id()),
            revision.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            escape(revision.message.trim_end()),
        );
    }
    body.push_str("</table>\n");
    page(&title, &body)
}

/// Write the scans page for `summary.record`'s organization.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the page cannot be written.
pub fn publish_scans(summary: &ScanSummary<'_>, report_root: &Path) -> Result<PathBuf, ReportError> {
    let dir = org_dir(report_root, &summary.record.org_id);
    std::fs::create_dir_all(&dir).map_err(ReportError::io(&dir))?;
    let path = dir.join(SCANS_FILE);
    std::fs::write(&path, render_scans_page(summary)).map_err(ReportError::io(&path))?;
    tracing::debug!(org_id = %summary.record.org_id, path = %path.display(), "published scans page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn revision(n: u32) -> Revision {
        Revision {
            id: format!("{n:040x}"),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, n).unwrap(),
            message: format!("Scan {n}\n"),
            parent: None,
        }
    }

    #[test]
    fn shows_counts_and_caps_history() {
        let mut record = ScanRecord::begin("o1", None);
        record.org_name = Some("Acme & Co".into());
        record.networks = 3;
        record.devices = 7;
        record.finish();
        let recent: Vec<Revision> = (0..15).rev().map(revision).collect();

        let html = render_scans_page(&ScanSummary {
            record: &record,
            settings: 42,
            recent: &recent,
        });
        assert!(html.contains("<td>o1<br>Acme &amp; Co</td><td>3</td><td>7</td><td>42</td>"));
        assert_eq!(html.matches("<tr><td><code>").count(), RECENT_SCANS);
        assert!(html.contains("Scan 14</td>"));
        assert!(!html.contains("Scan 4</td>"));
        assert!(html.contains("href=\"index.html\""));
    }

    #[test]
    fn empty_history_says_so() {
        let record = ScanRecord::begin("o1", None);
        let html = render_scans_page(&ScanSummary {
            record: &record,
            settings: 0,
            recent: &[],
        });
        assert!(html.contains("No revisions yet."));
        assert!(html.contains("o1 (o1): scans"));
    }
}
