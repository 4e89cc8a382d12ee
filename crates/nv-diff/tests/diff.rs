use std::path::Path;

use nv_core::ScopeKind;
use nv_diff::{ChangeStatus, Delta, DiffError, FieldChange, diff};
use nv_snapshot::{GitIdentity, SnapshotStore};
use pretty_assertions::assert_eq;
use serde_json::json;

fn identity() -> GitIdentity {
    GitIdentity {
        name: "netvault".into(),
        email: "netvault@localhost".into(),
    }
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

/// Two revisions: HEAD~1 and HEAD.
fn history() -> (tempfile::TempDir, SnapshotStore) {
    let temp = tempfile::tempdir().unwrap();
    let store = SnapshotStore::ensure_repository(temp.path(), &identity(), "test").unwrap();
    let root = temp.path();

    write(root, "Admins.json", "[\n    \"root\"\n]\n");
    write(root, "networks/N1/Vlans.json", "{\n    \"id\": 10\n}\n");
    write(root, "devices/S1/Ports.json", "[]\n");
    write(root, "notes.txt", "first\n");
    store.commit("scan 1").unwrap().unwrap();

    write(root, "networks/N1/Vlans.json", "{\n    \"id\": 20\n}\n");
    std::fs::remove_file(root.join("devices/S1/Ports.json")).unwrap();
    write(root, "devices/S2/Ports.json", "[\n    1\n]\n");
    write(root, "notes.txt", "second\n");
    store.commit("scan 2").unwrap().unwrap();
    (temp, store)
}

#[test]
fn classifies_and_orders_changes() {
    let (_temp, store) = history();
    let set = diff(&store, "HEAD~1", "HEAD").unwrap();

    let listed: Vec<(&str, ChangeStatus, ScopeKind)> = set
        .changes
        .iter()
        .map(|c| (c.path.as_str(), c.status, c.scope))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("notes.txt", ChangeStatus::Modified, ScopeKind::Organization),
            ("networks/N1/Vlans.json", ChangeStatus::Modified, ScopeKind::Network),
            ("devices/S1/Ports.json", ChangeStatus::Removed, ScopeKind::Device),
            ("devices/S2/Ports.json", ChangeStatus::Added, ScopeKind::Device),
        ]
    );

    assert_eq!(
        set.changes[1].delta,
        Delta::Structural {
            changes: vec![FieldChange::Changed {
                pointer: "/id".into(),
                old: json!(10),
                new: json!(20)
            }]
        }
    );
    assert_eq!(
        set.changes[0].delta,
        Delta::Opaque {
            old: Some("first\n".into()),
            new: Some("second\n".into())
        }
    );
    assert_eq!(set.count(ChangeStatus::Modified), 2);
}

#[test]
fn reversed_diff_swaps_added_and_removed() {
    let (_temp, store) = history();
    let forward = diff(&store, "HEAD~1", "HEAD").unwrap();
    let backward = diff(&store, "HEAD", "HEAD~1").unwrap();

    let mut forward_paths: Vec<&str> = forward.changes.iter().map(|c| c.path.as_str()).collect();
    let mut backward_paths: Vec<&str> = backward.changes.iter().map(|c| c.path.as_str()).collect();
    forward_paths.sort_unstable();
    backward_paths.sort_unstable();
    assert_eq!(forward_paths, backward_paths);

    for change in &forward.changes {
        let other = backward
            .changes
            .iter()
            .find(|c| c.path == change.path)
            .unwrap();
        assert_eq!(other.status, change.status.inverted());
        assert_eq!(other.delta, change.delta.clone().inverted());
    }
    assert_eq!(
        backward.paths(ChangeStatus::Added).collect::<Vec<_>>(),
        vec!["devices/S1/Ports.json"]
    );
}

#[test]
fn same_revision_is_an_empty_change_set() {
    let (_temp, store) = history();
    let set = diff(&store, "HEAD", "HEAD").unwrap();
    assert!(set.is_empty());
    assert_eq!(set.from, set.to);
}

#[test]
fn unknown_refs_are_reported() {
    let (_temp, store) = history();
    let err = diff(&store, "HEAD~5", "HEAD").unwrap_err();
    assert!(matches!(err, DiffError::UnknownRevision { ref reference, .. } if reference == "HEAD~5"));
    let err = diff(&store, "HEAD", "nothex").unwrap_err();
    assert!(matches!(err, DiffError::UnknownRevision { .. }));
}
