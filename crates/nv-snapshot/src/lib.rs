//! # nv-snapshot
//!
//! Everything netvault persists for an organization root
//! (`<base_path>/<org_id>/`):
//! - [`SnapshotWriter`]: byte-stable resource files under `settings/`
//! - [`SnapshotStore`]: the git history of `settings/`
//! - [`ScanLog`]: per-scan records under `scaninfo/`
//! - [`ArchiveLock`]: the advisory `.netvault.lock`

mod error;
mod lock;
mod scanlog;
mod store;
mod writer;

pub use error::SnapshotError;
pub use lock::{ArchiveLock, LOCK_FILE};
pub use scanlog::{SCANINFO_DIR, ScanLog};
pub use store::{GitIdentity, Revisions, SnapshotStore};
pub use writer::{SnapshotWriter, to_stable_json};

use std::path::{Path, PathBuf};

/// Git working tree inside an organization root.
pub const SETTINGS_DIR: &str = "settings";

#[must_use]
pub fn settings_root(org_root: &Path) -> PathBuf {
    org_root.join(SETTINGS_DIR)
}
