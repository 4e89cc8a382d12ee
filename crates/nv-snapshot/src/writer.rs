//! Byte-stable resource files under an organization's `settings/` root.

use std::path::{Path, PathBuf};

use nv_core::Resource;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SnapshotError;

/// Directory that must survive a working-tree reset.
const GIT_DIR: &str = ".git";

pub struct SnapshotWriter {
    root: PathBuf,
}

impl SnapshotWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `resource` at its deterministic path, replacing prior content.
    /// Returns the path relative to the root.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] if the directory or file cannot be written.
    pub fn write(&self, resource: &Resource) -> Result<PathBuf, SnapshotError> {
        let relative = resource.id.path();
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(SnapshotError::io(parent))?;
        }
        let text = to_stable_json(&resource.body)?;
        std::fs::write(&full, text).map_err(SnapshotError::io(&full))?;
        tracing::trace!(path = %relative.display(), "wrote resource");
        Ok(relative)
    }

    /// Remove everything under the root except `.git`, creating the root if
    /// needed. Returns the number of top-level entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] on the first entry that cannot be removed.
    pub fn reset(&self) -> Result<usize, SnapshotError> {
        std::fs::create_dir_all(&self.root).map_err(SnapshotError::io(&self.root))?;
        let entries = std::fs::read_dir(&self.root).map_err(SnapshotError::io(&self.root))?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(SnapshotError::io(&self.root))?;
            if entry.file_name() == GIT_DIR {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().map_err(SnapshotError::io(&path))?;
            if file_type.is_dir() {
                std::fs::remove_dir_all(&path).map_err(SnapshotError::io(&path))?;
            } else {
                std::fs::remove_file(&path).map_err(SnapshotError::io(&path))?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Serialize with object keys sorted at every level, four-space indentation,
/// and a trailing newline.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn to_stable_json(value: &Value) -> Result<String, SnapshotError> {
    let canonical = canonicalize(value);
    let mut buf = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    canonical.serialize(&mut ser)?;
    buf.push(b'\n');
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
