//! Advisory per-organization lock.
//!
//! The lock file holds the owner's pid. A lock whose pid is no longer running
//! is reclaimed; a live one is waited on until the timeout.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::SnapshotError;

pub const LOCK_FILE: &str = ".netvault.lock";
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Held for the duration of a scan or diff. Dropping it removes the file.
#[derive(Debug)]
pub struct ArchiveLock {
    path: PathBuf,
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl ArchiveLock {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock on `org_root`, waiting up to `timeout` for a live owner.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::LockTimeout`] if another live process keeps it
    /// - [`SnapshotError::LockUnavailable`] if the file cannot be created or read
    pub async fn acquire(org_root: &Path, timeout: Duration) -> Result<Self, SnapshotError> {
        let lock_path = org_root.join(LOCK_FILE);
        let started = Instant::now();

        loop {
            match try_acquire(&lock_path) {
                Ok(guard) => return Ok(guard),
                Err(LockState::HeldBy(pid)) => {
                    if started.elapsed() >= timeout {
                        return Err(SnapshotError::LockTimeout {
                            path: org_root.to_path_buf(),
                            pid,
                        });
                    }
                    tracing::debug!(pid, path = %lock_path.display(), "archive locked, waiting");
                    tokio::time::sleep(LOCK_RETRY_DELAY).await;
                }
                Err(LockState::Stale(pid)) => {
                    tracing::warn!(pid, path = %lock_path.display(), "reclaiming stale archive lock");
                    let _ = std::fs::remove_file(&lock_path);
                }
                Err(LockState::Unknown) => {
                    if started.elapsed() >= timeout {
                        return Err(SnapshotError::LockUnavailable(lock_path));
                    }
                    tokio::time::sleep(LOCK_RETRY_DELAY).await;
                }
            }
        }
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(u32),
    Stale(u32),
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<ArchiveLock, LockState> {
    if let Some(parent) = lock_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(ArchiveLock {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
                .is_err()
            {
                return Err(LockState::Unknown);
            }

            match pid_buf.trim().parse::<u32>().ok() {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(pid) => Err(LockState::Stale(pid)),
                None => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn is_process_running(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
