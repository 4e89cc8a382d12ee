//! Revision-to-revision change-sets.

use std::collections::BTreeSet;

use nv_core::{Revision, ScopeKind, scope_kind_of_path};
use nv_snapshot::SnapshotStore;
use serde::Serialize;

use crate::delta::Delta;
use crate::error::DiffError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
}

impl ChangeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }

    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
            Self::Modified => Self::Modified,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathChange {
    /// Path relative to the settings root, `/`-separated.
    pub path: String,
    pub scope: ScopeKind,
    pub status: ChangeStatus,
    pub delta: Delta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub from: Revision,
    pub to: Revision,
    /// Ordered by scope kind, then path.
    pub changes: Vec<PathChange>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn count(&self, status: ChangeStatus) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }

    /// Paths of all changes with `status`.
    pub fn paths(&self, status: ChangeStatus) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |c| c.status == status)
            .map(|c| c.path.as_str())
    }
}

/// Resolve `ref_a` and `ref_b` in `store` and compare them.
///
/// # Errors
///
/// - [`DiffError::UnknownRevision`] if either ref does not resolve
/// - [`DiffError::Store`] if a tree or blob cannot be read
pub fn diff(store: &SnapshotStore, ref_a: &str, ref_b: &str) -> Result<ChangeSet, DiffError> {
    let from = store.resolve(ref_a)?;
    let to = store.resolve(ref_b)?;
    diff_revisions(store, from, to)
}

/// Compare two already-resolved revisions.
///
/// # Errors
///
/// Returns [`DiffError::Store`] if a tree or blob cannot be read.
pub fn diff_revisions(
    store: &SnapshotStore,
    from: Revision,
    to: Revision,
) -> Result<ChangeSet, DiffError> {
    let old = store.tree_files(&from)?;
    let new = store.tree_files(&to)?;

    let read = |blob: &str| -> Result<String, DiffError> {
        Ok(String::from_utf8_lossy(&store.read_blob(blob)?).into_owned())
    };

    let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut changes = Vec::new();
    for path in paths {
        let (status, delta) = match (old.get(path), new.get(path)) {
            (Some(a), Some(b)) if a == b => continue,
            (Some(a), Some(b)) => {
                let (old_text, new_text) = (read(a)?, read(b)?);
                (
                    ChangeStatus::Modified,
                    Delta::between(Some(old_text.as_str()), Some(new_text.as_str())),
                )
            }
            (Some(a), None) => {
                let text = read(a)?;
                (ChangeStatus::Removed, Delta::between(Some(text.as_str()), None))
            }
            (None, Some(b)) => {
                let text = read(b)?;
                (ChangeStatus::Added, Delta::between(None, Some(text.as_str())))
            }
            (None, None) => continue,
        };
        changes.push(PathChange {
            path: path.clone(),
            scope: scope_kind_of_path(path),
            status,
            delta,
        });
    }
    sort_changes(&mut changes);

    tracing::debug!(
        from = from.short_id(),
        to = to.short_id(),
        changes = changes.len(),
        "computed change-set"
    );
    Ok(ChangeSet { from, to, changes })
}

fn sort_changes(changes: &mut [PathChange]) {
    changes.sort_by(|a, b| a.scope.cmp(&b.scope).then_with(|| a.path.cmp(&b.path)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn change(path: &str) -> PathChange {
        PathChange {
            path: path.into(),
            scope: scope_kind_of_path(path),
            status: ChangeStatus::Modified,
            delta: Delta::Opaque {
                old: None,
                new: None,
            },
        }
    }

    #[test]
    fn orders_by_scope_then_path() {
        let mut changes = vec![
            change("devices/S1/Ports.json"),
            change("networks/N2/Vlans.json"),
            change("Admins.json"),
            change("networks/N1/Vlans.json"),
            change("Alerts.json"),
        ];
        sort_changes(&mut changes);
        let order: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "Admins.json",
                "Alerts.json",
                "networks/N1/Vlans.json",
                "networks/N2/Vlans.json",
                "devices/S1/Ports.json",
            ]
        );
    }
}
