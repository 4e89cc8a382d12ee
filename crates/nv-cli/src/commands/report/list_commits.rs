use anyhow::Context;
use chrono::{DateTime, Utc};
use nv_config::NetvaultConfig;
use nv_snapshot::{SnapshotStore, settings_root};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CommitRow {
    id: String,
    timestamp: DateTime<Utc>,
    message: String,
}

pub fn handle(
    config: &NetvaultConfig,
    org_id: &str,
    limit: Option<usize>,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let root = settings_root(&config.archive.org_root(org_id));
    let store = SnapshotStore::open(&root)
        .with_context(|| format!("organization {org_id} has not been archived"))?;

    let mut rows = Vec::new();
    for revision in store.revisions()?.take(limit.unwrap_or(usize::MAX)) {
        let revision = revision?;
        rows.push(CommitRow {
            id: revision.id,
            timestamp: revision.timestamp,
            message: revision.message.trim_end().to_string(),
        });
    }
    output(&rows, flags.format)
}
