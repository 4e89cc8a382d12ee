//! Integration tests for layered configuration loading.
//!
//! Uses figment::Jail for sandboxed env var and working-directory manipulation.

use figment::Jail;
use nv_config::NetvaultConfig;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

#[test]
fn loads_sections_from_project_config() {
    Jail::expect_with(|jail| {
        jail.create_dir(".netvault")?;
        jail.create_file(
            ".netvault/config.toml",
            r#"
[api]
base_url = "https://api.example.test/v1"
page_size = 500

[limits]
requests_per_second = 5
workers = 2

[archive]
base_path = "/srv/netvault/orgs"
lock_timeout_secs = 60

[git]
user_name = "Scanner"
user_email = "scanner@example.test"
"#,
        )?;

        let config = NetvaultConfig::load(None).expect("config loads");
        assert_eq!(config.api.base_url, "https://api.example.test/v1");
        assert_eq!(config.api.page_size, 500);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.limits.requests_per_second, 5);
        assert_eq!(config.limits.workers, 2);
        assert_eq!(config.limits.max_attempts, 4);
        assert_eq!(config.archive.base_path, PathBuf::from("/srv/netvault/orgs"));
        assert_eq!(config.archive.lock_timeout_secs, 60);
        assert_eq!(config.git.user_name, "Scanner");
        Ok(())
    });
}

#[test]
fn explicit_config_file_beats_project_config() {
    Jail::expect_with(|jail| {
        jail.create_dir(".netvault")?;
        jail.create_file(".netvault/config.toml", "[limits]\nworkers = 2\n")?;
        jail.create_file("override.toml", "[limits]\nworkers = 7\n")?;

        let config = NetvaultConfig::load(Some(Path::new("override.toml"))).expect("config loads");
        assert_eq!(config.limits.workers, 7);
        Ok(())
    });
}

#[test]
fn env_beats_files() {
    Jail::expect_with(|jail| {
        jail.create_file("override.toml", "[limits]\nworkers = 7\n")?;
        jail.set_env("NETVAULT_LIMITS__WORKERS", "9");
        jail.set_env("NETVAULT_REPORT__OUTPUT_DIR", "/tmp/reports");

        let config = NetvaultConfig::load(Some(Path::new("override.toml"))).expect("config loads");
        assert_eq!(config.limits.workers, 9);
        assert_eq!(config.report.output_dir, PathBuf::from("/tmp/reports"));
        Ok(())
    });
}

#[test]
fn invalid_values_are_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("NETVAULT_LIMITS__MAX_IN_FLIGHT", "0");
        assert!(NetvaultConfig::load(None).is_err());
        Ok(())
    });
}
