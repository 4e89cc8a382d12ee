//! # nv-config
//!
//! Layered configuration loading for netvault using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`NETVAULT_*` prefix, `__` as separator)
//! 2. `MERAKI_DASHBOARD_API_KEY` (credential fallback only)
//! 3. The file passed with `--config`
//! 4. Project-level `.netvault/config.toml`
//! 5. User-level `~/.config/netvault/config.toml`
//! 6. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `NETVAULT_LIMITS__WORKERS` -> `limits.workers`,
//! `NETVAULT_ARCHIVE__BASE_PATH` -> `archive.base_path`, and
//! `NETVAULT_API_KEY` -> `api_key`.
//!
//! # Usage
//!
//! ```no_run
//! use nv_config::NetvaultConfig;
//!
//! let config = NetvaultConfig::load_with_dotenv(None).expect("config");
//! let key = config.api_key().expect("credential");
//! println!("scanning with {} workers", config.limits.effective_workers());
//! # let _ = key;
//! ```

mod api;
mod archive;
mod error;
mod limits;

pub use api::{ApiConfig, ApiKey};
pub use archive::{ArchiveConfig, GitConfig, ReportConfig};
pub use error::ConfigError;
pub use limits::LimitsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "NETVAULT_";
/// Credential variable honoured when `NETVAULT_API_KEY` is unset.
pub const FALLBACK_KEY_VAR: &str = "MERAKI_DASHBOARD_API_KEY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetvaultConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub report: ReportConfig,

    /// Dashboard credential. Only ever read from the environment.
    #[serde(default, skip_serializing)]
    pub api_key: Option<ApiKey>,
}

impl NetvaultConfig {
    /// Load configuration from all sources and validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] on malformed sources and
    /// [`ConfigError::InvalidValue`] when a value is out of range.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory first, then [`Self::load`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(config_file)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer more providers.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".netvault/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Exact path: no search through parent directories.
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file_exact(path));
        }

        figment = figment.merge(
            Env::raw()
                .only(&[FALLBACK_KEY_VAR])
                .map(|_| "api_key".into()),
        );
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// The API credential, or an error explaining where to set it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] if no non-empty key is set.
    pub fn api_key(&self) -> Result<&ApiKey, ConfigError> {
        self.api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::NotConfigured {
                field: "api_key".into(),
                hint: format!("set {ENV_PREFIX}API_KEY or {FALLBACK_KEY_VAR}"),
            })
    }

    /// Range checks figment cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("limits.requests_per_second", self.limits.requests_per_second),
            ("limits.max_in_flight", self.limits.max_in_flight),
            ("limits.workers", self.limits.workers),
            ("limits.max_attempts", self.limits.max_attempts),
            ("api.page_size", self.api.page_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: "must be at least 1".into(),
                });
            }
        }
        if self.limits.base_delay_ms > self.limits.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "limits.base_delay_ms".into(),
                reason: "must not exceed limits.max_delay_ms".into(),
            });
        }
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".into(),
                reason: "must be an http(s) URL".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("netvault").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NetvaultConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.api_key().is_err());
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut config = NetvaultConfig::default();
        config.limits.requests_per_second = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limits.requests_per_second"));
    }

    #[test]
    fn base_url_must_be_http() {
        let mut config = NetvaultConfig::default();
        config.api.base_url = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn serialized_config_never_contains_key() {
        let config = NetvaultConfig {
            api_key: Some(ApiKey::new("abc123secret")),
            ..NetvaultConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("abc123secret"));
    }
}
