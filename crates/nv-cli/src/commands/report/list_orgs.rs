use std::path::Path;

use anyhow::Context;
use nv_config::NetvaultConfig;
use nv_snapshot::{ScanLog, settings_root};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ArchivedOrg {
    pub id: String,
    /// Name recorded by the latest scan.
    pub name: Option<String>,
    pub scans: usize,
}

pub fn handle(config: &NetvaultConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&archived_orgs(&config.archive.base_path)?, flags.format)
}

/// Organizations under `base_path` that have a settings repository, by id.
pub fn archived_orgs(base_path: &Path) -> anyhow::Result<Vec<ArchivedOrg>> {
    if !base_path.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(base_path)
        .with_context(|| format!("failed to read archive {}", base_path.display()))?;

    let mut orgs = Vec::new();
    for entry in entries {
        let org_root = entry?.path();
        if !settings_root(&org_root).join(".git").is_dir() {
            continue;
        }
        let Some(id) = org_root.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let history = match ScanLog::new(&org_root).history() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(org_id = %id, error = %e, "unreadable scan log");
                Vec::new()
            }
        };
        orgs.push(ArchivedOrg {
            name: history.iter().rev().find_map(|r| r.org_name.clone()),
            scans: history.len(),
            id,
        });
    }
    orgs.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(orgs)
}
