use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use nv_api::{Fetcher, HttpTransport};
use nv_config::NetvaultConfig;
use nv_core::{RunStatus, ScanRecord};
use nv_extract::{ExtractError, ScanSettings, Scheduler};
use nv_report::{RECENT_SCANS, ScanSummary, publish_scans};
use nv_snapshot::{GitIdentity, SnapshotStore, settings_root};
use serde::Serialize;

use crate::bootstrap;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;
use crate::progress::Progress;

/// One line per scan in table output.
#[derive(Debug, Serialize)]
struct ScanRow {
    org_id: String,
    org_name: String,
    status: RunStatus,
    written: usize,
    skipped: usize,
    failed: usize,
    revision: Option<String>,
    issues: Option<String>,
}

impl From<&ScanRecord> for ScanRow {
    fn from(record: &ScanRecord) -> Self {
        Self {
            org_id: record.org_id.clone(),
            org_name: record.org_name.clone().unwrap_or_default(),
            status: record.status,
            written: record.written,
            skipped: record.skipped.len(),
            failed: record.failed.len(),
            revision: record
                .revision
                .as_deref()
                .map(|id| id.chars().take(10).collect()),
            issues: issue_summary(record),
        }
    }
}

/// Why a scan aborted, or which resources were skipped or failed.
fn issue_summary(record: &ScanRecord) -> Option<String> {
    if let Some(reason) = &record.abort_reason {
        return Some(format!("aborted: {reason}"));
    }
    let issues: Vec<String> = record
        .failed
        .iter()
        .map(|issue| format!("failed {}: {}", issue.resource, issue.reason))
        .chain(
            record
                .skipped
                .iter()
                .map(|issue| format!("skipped {}: {}", issue.resource, issue.reason)),
        )
        .chain(record.warnings.iter().cloned())
        .collect();
    (!issues.is_empty()).then(|| issues.join("; "))
}

fn status_line(record: &ScanRecord) -> String {
    let org_id = &record.org_id;
    match record.status {
        RunStatus::Completed => format!("{org_id}: completed"),
        RunStatus::CompletedWithIssues => format!(
            "{org_id}: completed_with_issues ({} skipped, {} failed, {} warnings)",
            record.skipped.len(),
            record.failed.len(),
            record.warnings.len()
        ),
        RunStatus::Aborted => format!(
            "{org_id}: aborted ({})",
            record.abort_reason.as_deref().unwrap_or("no reason recorded")
        ),
    }
}

/// Refresh `orgs/<org_id>/scans.html` from `record` and the archive history.
fn publish_scan_page(
    base_path: &Path,
    report_root: &Path,
    record: &ScanRecord,
) -> anyhow::Result<PathBuf> {
    let store = SnapshotStore::open(&settings_root(&base_path.join(&record.org_id)))?;
    let head = store.resolve("HEAD")?;
    let settings = store.tree_files(&head)?.len();
    let recent = store
        .revisions()?
        .take(RECENT_SCANS)
        .collect::<Result<Vec<_>, _>>()?;
    let path = publish_scans(
        &ScanSummary {
            record,
            settings,
            recent: &recent,
        },
        report_root,
    )?;
    Ok(path)
}

fn scan_settings(config: &NetvaultConfig) -> ScanSettings {
    ScanSettings {
        base_path: config.archive.base_path.clone(),
        identity: GitIdentity {
            name: config.git.user_name.clone(),
            email: config.git.user_email.clone(),
        },
        lock_timeout: config.archive.lock_timeout(),
        workers: config.limits.effective_workers(),
    }
}

pub async fn handle(
    fetcher: Arc<Fetcher<HttpTransport>>,
    config: &NetvaultConfig,
    org_ids: &[String],
    tag: Option<&str>,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let catalog = bootstrap::load_catalog(config)?;
    let scheduler = Scheduler::new(fetcher, scan_settings(config));

    let mut records = Vec::with_capacity(org_ids.len());
    for org_id in org_ids {
        let progress = Arc::new(Progress::scan(org_id));
        match scheduler.run(org_id, &catalog, tag, progress.clone()).await {
            Ok(record) => {
                let summary = status_line(&record);
                if record.status == RunStatus::Aborted {
                    progress.finish_err(&summary);
                } else {
                    progress.finish_ok(&summary);
                    if let Err(e) =
                        publish_scan_page(&config.archive.base_path, &config.report.output_dir, &record)
                    {
                        tracing::warn!(org_id = %org_id, error = %e, "could not refresh scans page");
                    }
                }
                records.push(record);
            }
            Err(ExtractError::Auth) => {
                progress.finish_err(&format!("{org_id}: credential rejected"));
                return Err(ExtractError::Auth.into());
            }
            Err(e) => {
                progress.finish_err(&format!("{org_id}: {e}"));
                return Err(e.into());
            }
        }
    }

    if flags.format == OutputFormat::Table {
        let rows: Vec<ScanRow> = records.iter().map(ScanRow::from).collect();
        output(&rows, flags.format)?;
    } else {
        output(&records, flags.format)?;
    }

    let failures = records.iter().filter(|r| r.is_failure()).count();
    if failures > 0 {
        bail!("{failures} of {} scans aborted or recorded failed resources", records.len());
    }
    Ok(())
}
