use chrono::{TimeZone, Utc};
use nv_core::{Revision, ScanRecord, ScopeKind};
use nv_diff::{ChangeSet, ChangeStatus, Delta, PathChange};
use nv_report::{
    ReportError, ReportMeta, ScanSummary, org_dir, publish, publish_scans, render, render_as,
    reserve_stamp,
};
use pretty_assertions::assert_eq;

fn revision(id: &str) -> Revision {
    Revision {
        id: id.into(),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        message: "scan".into(),
        parent: None,
    }
}

fn change_set() -> ChangeSet {
    ChangeSet {
        from: revision("1111111111aaaa"),
        to: revision("2222222222bbbb"),
        changes: vec![PathChange {
            path: "networks/N1/Vlans.json".into(),
            scope: ScopeKind::Network,
            status: ChangeStatus::Modified,
            delta: Delta::Opaque {
                old: Some("a".into()),
                new: Some("b".into()),
            },
        }],
    }
}

fn meta(second: u32) -> ReportMeta {
    ReportMeta {
        org_id: "o1".into(),
        org_name: "Acme".into(),
        generated_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, second).unwrap(),
    }
}

#[test]
fn publishes_pages_and_indexes_newest_first() {
    let temp = tempfile::tempdir().unwrap();

    let first = render(&change_set(), &meta(1));
    let published = publish(&first, temp.path()).unwrap();
    let org = org_dir(temp.path(), "o1");
    assert_eq!(published.summary, org.join("reports/2026-02-01--12-00-01.html"));
    assert_eq!(published.details, 1);
    assert!(org
        .join("reports/2026-02-01--12-00-01/0001-networks-N1-Vlans.html")
        .is_file());
    assert_eq!(std::fs::read_to_string(&published.summary).unwrap(), first.summary);

    let second = render(&change_set(), &meta(2));
    publish(&second, temp.path()).unwrap();

    let index = std::fs::read_to_string(org.join("index.html")).unwrap();
    let newer = index.find("2026-02-01--12-00-02.html").unwrap();
    let older = index.find("2026-02-01--12-00-01.html").unwrap();
    assert!(newer < older, "newest report must be listed first");
    assert_eq!(index.matches("<tr><td><a href=").count(), 2);

    let latest = std::fs::read_to_string(org.join("latest.html")).unwrap();
    assert!(latest.contains("url=reports/2026-02-01--12-00-02.html"));
}

fn other_change_set() -> ChangeSet {
    ChangeSet {
        from: revision("3333333333cccc"),
        to: revision("4444444444dddd"),
        changes: vec![PathChange {
            path: "Admins.json".into(),
            scope: ScopeKind::Organization,
            status: ChangeStatus::Added,
            delta: Delta::Opaque {
                old: None,
                new: Some("[]".into()),
            },
        }],
    }
}

#[test]
fn reports_in_the_same_second_get_distinct_stamps() {
    let temp = tempfile::tempdir().unwrap();
    let org = org_dir(temp.path(), "o1");

    let first_stamp = reserve_stamp(temp.path(), &meta(0)).unwrap();
    let first = render_as(&change_set(), &meta(0), &first_stamp);
    let first_published = publish(&first, temp.path()).unwrap();

    let second_stamp = reserve_stamp(temp.path(), &meta(0)).unwrap();
    let second = render_as(&other_change_set(), &meta(0), &second_stamp);
    let second_published = publish(&second, temp.path()).unwrap();

    assert_eq!(first_stamp, "2026-02-01--12-00-00");
    assert_eq!(second_stamp, "2026-02-01--12-00-00-2");
    assert_ne!(first_published.summary, second_published.summary);

    let first_summary = std::fs::read_to_string(&first_published.summary).unwrap();
    assert!(first_summary.contains("1111111"));
    assert!(second.summary.contains("href=\"2026-02-01--12-00-00-2/0001-Admins.html\""));

    let mut first_details: Vec<String> = std::fs::read_dir(org.join("reports/2026-02-01--12-00-00"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    first_details.sort();
    assert_eq!(first_details, vec!["0001-networks-N1-Vlans.html"]);
    assert!(org
        .join("reports/2026-02-01--12-00-00-2/0001-Admins.html")
        .is_file());

    let index = std::fs::read_to_string(org.join("index.html")).unwrap();
    assert_eq!(index.matches("href=\"reports/2026-02-01--12-00-00.html\"").count(), 1);
    assert_eq!(index.matches("href=\"reports/2026-02-01--12-00-00-2.html\"").count(), 1);
}

#[test]
fn publishing_over_an_existing_report_is_refused() {
    let temp = tempfile::tempdir().unwrap();
    let report = render(&change_set(), &meta(5));
    publish(&report, temp.path()).unwrap();

    let again = render(&other_change_set(), &meta(5));
    let err = publish(&again, temp.path()).unwrap_err();
    assert!(matches!(err, ReportError::StampTaken { ref stamp } if stamp == "2026-02-01--12-00-05"));
}

#[test]
fn scans_page_is_rewritten_after_each_scan() {
    let temp = tempfile::tempdir().unwrap();
    publish(&render(&change_set(), &meta(9)), temp.path()).unwrap();

    let mut record = ScanRecord::begin("o1", None);
    record.org_name = Some("Acme".into());
    record.networks = 2;
    record.devices = 5;
    record.finish();
    let history = vec![revision("2222222222bbbb"), revision("1111111111aaaa")];

    let path = publish_scans(
        &ScanSummary {
            record: &record,
            settings: 12,
            recent: &history[1..],
        },
        temp.path(),
    )
    .unwrap();
    assert_eq!(path, org_dir(temp.path(), "o1").join("scans.html"));

    publish_scans(
        &ScanSummary {
            record: &record,
            settings: 13,
            recent: &history,
        },
        temp.path(),
    )
    .unwrap();
    let page = std::fs::read_to_string(&path).unwrap();
    assert!(page.contains("<td>o1<br>Acme</td><td>2</td><td>5</td><td>13</td>"));
    assert_eq!(page.matches("<tr><td><code>").count(), 2);

    let index = std::fs::read_to_string(org_dir(temp.path(), "o1").join("index.html")).unwrap();
    assert!(index.contains("href=\"scans.html\""));
}
