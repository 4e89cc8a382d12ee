use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A commit in an organization's snapshot history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Revision {
    /// Full hex object id.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// First parent, `None` for the first revision.
    pub parent: Option<String>,
}

impl Revision {
    /// Abbreviated id used in report names and tables.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(10);
        &self.id[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates() {
        let rev = Revision {
            id: "0123456789abcdef".into(),
            timestamp: Utc::now(),
            message: "m".into(),
            parent: None,
        };
        assert_eq!(rev.short_id(), "0123456789");

        let short = Revision {
            id: "abc".into(),
            ..rev
        };
        assert_eq!(short.short_id(), "abc");
    }
}
