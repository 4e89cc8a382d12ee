//! Cross-cutting error types for netvault.
//!
//! Domain-specific errors (`ApiError`, `SnapshotError`, `DiffError`, ...) are
//! defined in their respective crates. `anyhow` takes over in `nv-cli` where
//! all crate errors converge.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or interpreting shared domain data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The endpoint catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The endpoint catalog is not valid TOML or has the wrong shape.
    #[error("failed to parse catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    /// A catalog entry violates a catalog rule (duplicate, bad feature name, ...).
    #[error("invalid catalog entry '{feature}': {reason}")]
    InvalidDescriptor { feature: String, reason: String },

    /// A request path template is malformed.
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A template placeholder has no value for the given scope instance.
    #[error("placeholder {{{placeholder}}} has no value for {scope} scope")]
    MissingPlaceholder {
        placeholder: &'static str,
        scope: &'static str,
    },
}
