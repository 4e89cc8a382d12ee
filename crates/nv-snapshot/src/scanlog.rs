//! Scan log under `<org_root>/scaninfo/`.
//!
//! Every scan writes one `scanlog-<YYYY-MM-DD--HH-MM-SS>.json` record and
//! appends the same record to `scanlog.jsonl`.

use std::path::{Path, PathBuf};

use nv_core::ScanRecord;

use crate::error::SnapshotError;
use crate::writer::to_stable_json;

pub const SCANINFO_DIR: &str = "scaninfo";
const HISTORY_FILE: &str = "scanlog.jsonl";

pub struct ScanLog {
    dir: PathBuf,
}

impl ScanLog {
    #[must_use]
    pub fn new(org_root: &Path) -> Self {
        Self {
            dir: org_root.join(SCANINFO_DIR),
        }
    }

    /// Persist `record`. Returns the path of the per-scan file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] or [`SnapshotError::Json`] on write failure.
    pub fn record(&self, record: &ScanRecord) -> Result<PathBuf, SnapshotError> {
        std::fs::create_dir_all(&self.dir).map_err(SnapshotError::io(&self.dir))?;

        let stamp = record.started_at.format("%Y-%m-%d--%H-%M-%S");
        let mut path = self.dir.join(format!("scanlog-{stamp}.json"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("scanlog-{stamp}-{n}.json"));
            n += 1;
        }
        let value = serde_json::to_value(record)?;
        std::fs::write(&path, to_stable_json(&value)?).map_err(SnapshotError::io(&path))?;

        let history = self.dir.join(HISTORY_FILE);
        serde_jsonlines::append_json_lines(&history, [record])
            .map_err(SnapshotError::io(&history))?;
        Ok(path)
    }

    /// All records from the history file, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] if the file exists but cannot be parsed.
    pub fn history(&self) -> Result<Vec<ScanRecord>, SnapshotError> {
        let path = self.dir.join(HISTORY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .and_then(|lines| lines.collect::<std::io::Result<Vec<ScanRecord>>>())
            .map_err(SnapshotError::io(&path))
    }

    /// The most recent record, if any scan ran.
    ///
    /// # Errors
    ///
    /// Same as [`Self::history`].
    pub fn latest(&self) -> Result<Option<ScanRecord>, SnapshotError> {
        Ok(self.history()?.pop())
    }
}
