//! Change-set → HTML pages. Pure: the output depends only on the inputs.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use nv_core::ScopeKind;
use nv_diff::{ChangeSet, ChangeStatus, Delta, FieldChange, PathChange};
use serde::Serialize;
use serde_json::Value;

use crate::html::{escape, page};

/// Who and when, for page headers and file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    pub org_id: String,
    pub org_name: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportMeta {
    /// `YYYY-MM-DD--HH-MM-SS`, used for the report directory and file names.
    #[must_use]
    pub fn stamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d--%H-%M-%S").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPage {
    /// File name inside the report directory.
    pub file_name: String,
    pub path: String,
    #[serde(skip)]
    pub html: String,
}

/// A rendered report, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub stamp: String,
    pub from: String,
    pub to: String,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    #[serde(skip)]
    pub summary: String,
    pub details: Vec<DetailPage>,
}

/// Render the summary page and one detail page per changed path.
///
/// Summary links are relative to the directory that holds `<stamp>.html`;
/// detail pages live in the `<stamp>/` directory beside it.
#[must_use]
pub fn render(change_set: &ChangeSet, meta: &ReportMeta) -> Report {
    render_as(change_set, meta, &meta.stamp())
}

/// [`render`] under an explicit stamp, such as one handed out by
/// [`crate::reserve_stamp`].
#[must_use]
pub fn render_as(change_set: &ChangeSet, meta: &ReportMeta, stamp: &str) -> Report {
    let stamp = stamp.to_string();
    let details: Vec<DetailPage> = change_set
        .changes
        .iter()
        .enumerate()
        .map(|(i, change)| render_detail(i, change, change_set, meta, &stamp))
        .collect();

    Report {
        meta: meta.clone(),
        stamp: stamp.clone(),
        from: change_set.from.short_id().to_string(),
        to: change_set.to.short_id().to_string(),
        added: change_set.count(ChangeStatus::Added),
        removed: change_set.count(ChangeStatus::Removed),
        modified: change_set.count(ChangeStatus::Modified),
        summary: render_summary(change_set, meta, &stamp, &details),
        details,
    }
}

/// Stable, unique detail file name for the `index`-th change.
fn detail_file_name(index: usize, path: &str) -> String {
    let slug: String = path
        .trim_end_matches(".json")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{:04}-{slug}.html", index + 1)
}

fn revision_line(change_set: &ChangeSet) -> String {
    let when = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    format!(
        "<p class=\"meta\">From <code>{}</code> ({}) to <code>{}</code> ({})</p>\n",
        escape(change_set.from.short_id()),
        when(change_set.from.timestamp),
        escape(change_set.to.short_id()),
        when(change_set.to.timestamp),
    )
}

fn render_summary(
    change_set: &ChangeSet,
    meta: &ReportMeta,
    stamp: &str,
    details: &[DetailPage],
) -> String {
    let title = format!("{} ({}): changes", meta.org_name, meta.org_id);
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape(&title));
    body.push_str(&revision_line(change_set));
    let _ = writeln!(
        body,
        "<p>{} added, {} removed, {} modified</p>",
        change_set.count(ChangeStatus::Added),
        change_set.count(ChangeStatus::Removed),
        change_set.count(ChangeStatus::Modified),
    );

    if change_set.is_empty() {
        body.push_str("<p>No changes between these revisions.</p>\n");
        return page(&title, &body);
    }

    let mut current: Option<ScopeKind> = None;
    for (change, detail) in change_set.changes.iter().zip(details) {
        if current != Some(change.scope) {
            if current.is_some() {
                body.push_str("</table>\n");
            }
            current = Some(change.scope);
            let _ = writeln!(body, "<h2>{}</h2>", change.scope.section_title());
            body.push_str("<table>\n<tr><th>Change</th><th>Path</th><th>Fields</th></tr>\n");
        }
        let _ = writeln!(
            body,
            "<tr class=\"{status}\"><td>{status}</td><td><a href=\"{href}\">{path}</a></td><td>{fields}</td></tr>",
            status = change.status,
            href = escape(&format!("{stamp}/{}", detail.file_name)),
            path = escape(&change.path),
            fields = change.delta.len(),
        );
    }
    body.push_str("</table>\n");
    page(&title, &body)
}

fn render_detail(
    index: usize,
    change: &PathChange,
    change_set: &ChangeSet,
    meta: &ReportMeta,
    stamp: &str,
) -> DetailPage {
    let file_name = detail_file_name(index, &change.path);
    let title = format!("{} ({}): {}", meta.org_name, meta.org_id, change.path);

    let mut body = String::new();
    let _ = writeln!(
        body,
        "<p><a href=\"../{}.html\">Back to summary</a></p>",
        escape(stamp)
    );
    let _ = writeln!(
        body,
        "<h1>{} <span class=\"{status}\">{status}</span></h1>",
        escape(&change.path),
        status = change.status,
    );
    body.push_str(&revision_line(change_set));

    match &change.delta {
        Delta::Structural { changes } if changes.is_empty() => {
            body.push_str("<p>Only formatting differs; the documents are equal.</p>\n");
        }
        Delta::Structural { changes } => {
            body.push_str("<table>\n<tr><th>Field</th><th>Old</th><th>New</th></tr>\n");
            for field in changes {
                body.push_str(&field_row(field));
            }
            body.push_str("</table>\n");
        }
        Delta::Opaque { old, new } => {
            body.push_str("<table>\n<tr><th>Old</th><th>New</th></tr>\n");
            let _ = writeln!(
                body,
                "<tr><td class=\"{}\">{}</td><td class=\"{}\">{}</td></tr>",
                if old.is_some() { "removed" } else { "empty" },
                pre(old.as_deref().unwrap_or("")),
                if new.is_some() { "added" } else { "empty" },
                pre(new.as_deref().unwrap_or("")),
            );
            body.push_str("</table>\n");
        }
    }

    DetailPage {
        file_name,
        path: change.path.clone(),
        html: page(&title, &body),
    }
}

fn field_row(field: &FieldChange) -> String {
    let location = if field.pointer().is_empty() {
        "(document)".to_string()
    } else {
        escape(field.pointer())
    };
    let (old_class, old, new_class, new) = match field {
        FieldChange::Added { value, .. } => ("empty", String::new(), "added", pre(&pretty(value))),
        FieldChange::Removed { value, .. } => {
            ("removed", pre(&pretty(value)), "empty", String::new())
        }
        FieldChange::Changed { old, new, .. } => {
            ("changed", pre(&pretty(old)), "changed", pre(&pretty(new)))
        }
    };
    format!(
        "<tr><td><code>{location}</code></td><td class=\"{old_class}\">{old}</td><td class=\"{new_class}\">{new}</td></tr>\n"
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn pre(text: &str) -> String {
    format!("<pre>{}</pre>", escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nv_core::Revision;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn revision(id: &str, secs: i64) -> Revision {
        Revision {
            id: id.into(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            message: "scan".into(),
            parent: None,
        }
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            org_id: "o1".into(),
            org_name: "Acme <Corp>".into(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
        }
    }

    fn change_set() -> ChangeSet {
        ChangeSet {
            from: revision("aaaaaaaaaaaaaaaa", 1_700_000_000),
            to: revision("bbbbbbbbbbbbbbbb", 1_700_000_100),
            changes: vec![
                PathChange {
                    path: "Admins.json".into(),
                    scope: ScopeKind::Organization,
                    status: ChangeStatus::Modified,
                    delta: Delta::Structural {
                        changes: vec![FieldChange::Changed {
                            pointer: "/0/name".into(),
                            old: json!("root"),
                            new: json!("<script>"),
                        }],
                    },
                },
                PathChange {
                    path: "devices/S1/Ports.json".into(),
                    scope: ScopeKind::Device,
                    status: ChangeStatus::Added,
                    delta: Delta::Structural {
                        changes: vec![FieldChange::Added {
                            pointer: String::new(),
                            value: json!([1]),
                        }],
                    },
                },
            ],
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render(&change_set(), &meta());
        let b = render(&change_set(), &meta());
        assert_eq!(a, b);
    }

    #[test]
    fn summary_links_every_detail_page() {
        let report = render(&change_set(), &meta());
        assert_eq!(report.stamp, "2026-03-04--05-06-07");
        let names: Vec<&str> = report.details.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["0001-Admins.html", "0002-devices-S1-Ports.html"]);
        for name in names {
            assert!(report
                .summary
                .contains(&format!("href=\"2026-03-04--05-06-07/{name}\"")));
        }
        assert!(report.summary.contains("<h2>Organization</h2>"));
        assert!(report.summary.contains("<h2>Devices</h2>"));
        assert!(!report.summary.contains("<h2>Networks</h2>"));
        assert_eq!((report.added, report.removed, report.modified), (1, 0, 1));
    }

    #[test]
    fn detail_is_side_by_side_and_escaped() {
        let report = render(&change_set(), &meta());
        let detail = &report.details[0].html;
        assert!(detail.contains("href=\"../2026-03-04--05-06-07.html\""));
        assert!(detail.contains("<code>/0/name</code>"));
        assert!(detail.contains("class=\"changed\"><pre>&quot;root&quot;</pre>"));
        assert!(detail.contains("&lt;script&gt;"));
        assert!(!detail.contains("<script>"));
        assert!(report.summary.contains("Acme &lt;Corp&gt;"));
    }

    #[test]
    fn empty_change_set_renders_a_summary_only() {
        let mut set = change_set();
        set.changes.clear();
        let report = render(&set, &meta());
        assert!(report.details.is_empty());
        assert!(report.summary.contains("No changes between these revisions."));
    }
}
