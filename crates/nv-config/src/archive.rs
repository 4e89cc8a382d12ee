//! Archive, git identity, and report output locations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_base_path() -> PathBuf {
    PathBuf::from("./netvault/orgs")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("./netvault/catalog.toml")
}

const fn default_lock_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Directory holding one `<org_id>/` root per archived organization.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Endpoint catalog TOML file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// How long to wait for another process holding an organization's lock.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            catalog_path: default_catalog_path(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

impl ArchiveConfig {
    #[must_use]
    pub fn org_root(&self, org_id: &str) -> PathBuf {
        self.base_path.join(org_id)
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn default_user_name() -> String {
    "netvault".to_string()
}

fn default_user_email() -> String {
    "netvault@localhost".to_string()
}

/// Committer identity written into each organization's repository.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitConfig {
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_user_email")]
    pub user_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            user_email: default_user_email(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./netvault/web")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Root of the published report tree.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}
