//! Writes rendered reports into the web root.
//!
//! ```text
//! <report_root>/orgs/<org_id>/
//!     index.html                  every report, newest first
//!     scans.html                  last scan and recent revisions
//!     latest.html                 redirect to the newest summary
//!     reports/<stamp>.html        summary
//!     reports/<stamp>/*.html      detail pages
//! ```

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::html::{escape, page};
use crate::render::{Report, ReportMeta};
use crate::scans::SCANS_FILE;

const ORGS_DIR: &str = "orgs";
const REPORTS_DIR: &str = "reports";
pub(crate) const INDEX_FILE: &str = "index.html";
const LATEST_FILE: &str = "latest.html";
/// New index rows go directly below this line.
const ROWS_MARKER: &str = "<!-- netvault:rows -->";

/// Paths written by [`publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub summary: PathBuf,
    pub index: PathBuf,
    pub latest: PathBuf,
    pub details: usize,
}

#[must_use]
pub fn org_dir(report_root: &Path, org_id: &str) -> PathBuf {
    report_root.join(ORGS_DIR).join(org_id)
}

/// Claim a report stamp for `meta` that no earlier report of the organization
/// uses. The detail directory is created here, so two reports generated in
/// the same second get `<stamp>` and `<stamp>-2`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if the reports directory cannot be created.
pub fn reserve_stamp(report_root: &Path, meta: &ReportMeta) -> Result<String, ReportError> {
    let reports_dir = org_dir(report_root, &meta.org_id).join(REPORTS_DIR);
    std::fs::create_dir_all(&reports_dir).map_err(ReportError::io(&reports_dir))?;

    let base = meta.stamp();
    let mut n = 1u32;
    loop {
        let stamp = if n == 1 { base.clone() } else { format!("{base}-{n}") };
        n += 1;
        if reports_dir.join(format!("{stamp}.html")).exists() {
            continue;
        }
        let dir = reports_dir.join(&stamp);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(stamp),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(ReportError::io(&dir)(e)),
        }
    }
}

/// Write `report` under `report_root` and link it from the organization's
/// index and `latest.html`.
///
/// # Errors
///
/// - [`ReportError::StampTaken`] if a summary with the report's stamp exists
/// - [`ReportError::Io`] on the first file that cannot be written
pub fn publish(report: &Report, report_root: &Path) -> Result<Published, ReportError> {
    let org_dir = org_dir(report_root, &report.meta.org_id);
    let reports_dir = org_dir.join(REPORTS_DIR);
    let summary = reports_dir.join(format!("{}.html", report.stamp));
    if summary.exists() {
        return Err(ReportError::StampTaken {
            stamp: report.stamp.clone(),
        });
    }
    let detail_dir = reports_dir.join(&report.stamp);
    std::fs::create_dir_all(&detail_dir).map_err(ReportError::io(&detail_dir))?;

    for detail in &report.details {
        let path = detail_dir.join(&detail.file_name);
        std::fs::write(&path, &detail.html).map_err(ReportError::io(&path))?;
    }

    std::fs::write(&summary, &report.summary).map_err(ReportError::io(&summary))?;

    let latest = org_dir.join(LATEST_FILE);
    std::fs::write(&latest, latest_page(report)).map_err(ReportError::io(&latest))?;

    let index = org_dir.join(INDEX_FILE);
    let existing = match std::fs::read_to_string(&index) {
        Ok(text) if text.contains(ROWS_MARKER) => text,
        Ok(_) => {
            tracing::warn!(path = %index.display(), "index page has no row marker, recreating it");
            empty_index(report)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => empty_index(report),
        Err(e) => return Err(ReportError::io(&index)(e)),
    };
    let updated = existing.replacen(
        ROWS_MARKER,
        &format!("{ROWS_MARKER}\n{}", index_row(report)),
        1,
    );
    std::fs::write(&index, updated).map_err(ReportError::io(&index))?;

    tracing::info!(
        org_id = %report.meta.org_id,
        summary = %summary.display(),
        details = report.details.len(),
        "published report"
    );
    Ok(Published {
        summary,
        index,
        latest,
        details: report.details.len(),
    })
}

fn summary_href(report: &Report) -> String {
    format!("{REPORTS_DIR}/{}.html", report.stamp)
}

fn latest_page(report: &Report) -> String {
    let href = escape(&summary_href(report));
    let head = format!("<meta http-equiv=\"refresh\" content=\"0; url={href}\">\n");
    let body = format!("{head}<p><a href=\"{href}\">Latest report ({})</a></p>\n", escape(&report.stamp));
    page(&format!("{}: latest report", report.meta.org_name), &body)
}

fn empty_index(report: &Report) -> String {
    let title = format!("{} ({}): reports", report.meta.org_name, report.meta.org_id);
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape(&title));
    let _ = writeln!(body, "<p class=\"meta\"><a href=\"{SCANS_FILE}\">Scan history</a></p>");
    body.push_str("<table>\n<tr><th>Report</th><th>From</th><th>To</th><th>Added</th><th>Removed</th><th>Modified</th></tr>\n");
    body.push_str(ROWS_MARKER);
    body.push_str("\n</table>\n");
    page(&title, &body)
}

fn index_row(report: &Report) -> String {
    format!(
        "<tr><td><a href=\"{}\">{}</a></td><td><code>{}</code></td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&summary_href(report)),
        escape(&report.stamp),
        escape(&report.from),
        escape(&report.to),
        report.added,
        report.removed,
        report.modified,
    )
}
