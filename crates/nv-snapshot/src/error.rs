use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("git error: {0}")]
    Git(String),
    #[error("not a snapshot repository: {0}")]
    NotARepository(PathBuf),
    #[error("unknown revision '{reference}': {reason}")]
    UnknownRevision { reference: String, reason: String },
    #[error("archive {path} is locked by pid {pid}; gave up waiting")]
    LockTimeout { path: PathBuf, pid: u32 },
    #[error("could not take lock {0}; remove it if no netvault process is running")]
    LockUnavailable(PathBuf),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn unknown(reference: &str, reason: impl Into<String>) -> Self {
        Self::UnknownRevision {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
