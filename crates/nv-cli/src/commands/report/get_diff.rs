use anyhow::Context;
use nv_config::NetvaultConfig;
use nv_diff::ChangeStatus;
use nv_report::{ReportMeta, publish, render_as, reserve_stamp};
use nv_snapshot::{ArchiveLock, ScanLog, SnapshotStore, settings_root};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct ChangeRow {
    status: ChangeStatus,
    path: String,
    fields: usize,
}

#[derive(Debug, Serialize)]
struct DiffResponse {
    org_id: String,
    from: String,
    to: String,
    added: usize,
    removed: usize,
    modified: usize,
    report: String,
    changes: Vec<ChangeRow>,
}

pub async fn handle(
    config: &NetvaultConfig,
    org_id: &str,
    revision_a: &str,
    revision_b: &str,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let org_root = config.archive.org_root(org_id);
    let store = SnapshotStore::open(&settings_root(&org_root))
        .with_context(|| format!("organization {org_id} has not been archived"))?;
    let _lock = ArchiveLock::acquire(&org_root, config.archive.lock_timeout()).await?;

    let spinner = Progress::spinner(&format!("{org_id}: comparing {revision_a}..{revision_b}"));
    let change_set = nv_diff::diff(&store, revision_a, revision_b);
    spinner.finish_clear();
    let change_set = change_set?;

    let org_name = ScanLog::new(&org_root)
        .latest()
        .ok()
        .flatten()
        .and_then(|record| record.org_name)
        .unwrap_or_else(|| org_id.to_string());
    let meta = ReportMeta {
        org_id: org_id.to_string(),
        org_name,
        generated_at: chrono::Utc::now(),
    };
    let stamp = reserve_stamp(&config.report.output_dir, &meta)?;
    let report = render_as(&change_set, &meta, &stamp);
    let published = publish(&report, &config.report.output_dir)?;

    let response = DiffResponse {
        org_id: org_id.to_string(),
        from: change_set.from.id.clone(),
        to: change_set.to.id.clone(),
        added: report.added,
        removed: report.removed,
        modified: report.modified,
        report: published.summary.display().to_string(),
        changes: change_set
            .changes
            .iter()
            .map(|c| ChangeRow {
                status: c.status,
                path: c.path.clone(),
                fields: c.delta.len(),
            })
            .collect(),
    };
    output(&response, flags.format)
}
