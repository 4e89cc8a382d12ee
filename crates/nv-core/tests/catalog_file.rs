use nv_core::{Catalog, CoreError, ScopeKind};

#[test]
fn loads_catalog_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[endpoint]]
scope = "organization"
feature = "Admins"
path = "/organizations/{organizationId}/admins"

[[endpoint]]
scope = "device"
feature = "ManagementInterface"
path = "/devices/{serial}/managementInterface"
"#,
    )
    .unwrap();

    let catalog = Catalog::load(&path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.for_scope(ScopeKind::Device).count(), 1);
}

#[test]
fn missing_catalog_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Catalog::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::CatalogIo { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn empty_catalog_is_valid() {
    let catalog = Catalog::from_toml_str("").unwrap();
    assert!(catalog.is_empty());
}
