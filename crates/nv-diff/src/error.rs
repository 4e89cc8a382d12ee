use nv_snapshot::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("unknown revision '{reference}': {reason}")]
    UnknownRevision { reference: String, reason: String },

    #[error("snapshot store error: {0}")]
    Store(SnapshotError),
}

impl From<SnapshotError> for DiffError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::UnknownRevision { reference, reason } => {
                Self::UnknownRevision { reference, reason }
            }
            other => Self::Store(other),
        }
    }
}
