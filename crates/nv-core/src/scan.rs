//! Scan records: the persisted outcome of one extraction pass.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resource::ResourceId;

/// Final status of a command or scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithIssues,
    Aborted,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithIssues => "completed_with_issues",
            Self::Aborted => "aborted",
        }
    }

    /// Whether the command should exit non-zero.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource that was skipped or failed, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceIssue {
    pub resource: ResourceId,
    pub reason: String,
}

/// One scan-log record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScanRecord {
    pub org_id: String,
    pub org_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    /// HEAD after the scan, whether or not this scan created it. `None` when
    /// the scan aborted before committing.
    pub revision: Option<String>,
    /// Whether `revision` was created by this scan.
    #[serde(default)]
    pub committed: bool,
    pub tag_filter: Option<String>,
    pub networks: usize,
    pub devices: usize,
    pub planned: usize,
    pub written: usize,
    pub skipped: Vec<ResourceIssue>,
    pub failed: Vec<ResourceIssue>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub abort_reason: Option<String>,
}

impl ScanRecord {
    /// A fresh record for a scan starting now.
    #[must_use]
    pub fn begin(org_id: &str, tag_filter: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            org_id: org_id.to_string(),
            org_name: None,
            started_at: now,
            finished_at: now,
            status: RunStatus::Completed,
            revision: None,
            committed: false,
            tag_filter: tag_filter.map(ToString::to_string),
            networks: 0,
            devices: 0,
            planned: 0,
            written: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
            warnings: Vec::new(),
            abort_reason: None,
        }
    }

    /// Stamp the finish time and derive the status from the recorded issues.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.status = if self.abort_reason.is_some() {
            RunStatus::Aborted
        } else if self.failed.is_empty() && self.skipped.is_empty() && self.warnings.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithIssues
        };
    }

    /// Mark the scan aborted with `reason` and finish it.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.abort_reason = Some(reason.into());
        self.finish();
    }

    /// Whether this scan should make the command exit non-zero.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure() || !self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeKind;

    fn issue() -> ResourceIssue {
        ResourceIssue {
            resource: ResourceId {
                kind: ScopeKind::Network,
                instance_id: "N1".into(),
                feature: "Vlans".into(),
            },
            reason: "HTTP 400".into(),
        }
    }

    #[test]
    fn clean_scan_completes() {
        let mut rec = ScanRecord::begin("o1", None);
        rec.finish();
        assert_eq!(rec.status, RunStatus::Completed);
        assert!(!rec.is_failure());
    }

    #[test]
    fn skipped_resources_are_issues_but_not_failures() {
        let mut rec = ScanRecord::begin("o1", None);
        rec.skipped.push(issue());
        rec.finish();
        assert_eq!(rec.status, RunStatus::CompletedWithIssues);
        assert!(!rec.is_failure());
    }

    #[test]
    fn failed_resources_fail_the_command() {
        let mut rec = ScanRecord::begin("o1", Some("prod"));
        rec.failed.push(issue());
        rec.finish();
        assert_eq!(rec.status, RunStatus::CompletedWithIssues);
        assert!(rec.is_failure());
    }

    #[test]
    fn abort_sets_reason_and_status() {
        let mut rec = ScanRecord::begin("o1", None);
        rec.abort("unknown organization");
        assert_eq!(rec.status, RunStatus::Aborted);
        assert_eq!(rec.abort_reason.as_deref(), Some("unknown organization"));
        assert!(rec.is_failure());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RunStatus::CompletedWithIssues).unwrap();
        assert_eq!(json, "\"completed_with_issues\"");
    }
}
