//! API client error types.

use thiserror::Error;

/// A request that never produced an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The client could not be constructed.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Terminal outcome of a fetch that did not yield a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A 4xx other than 429: the endpoint does not apply to this scope instance.
    #[error("not applicable (HTTP {status}): {message}")]
    NotApplicable { status: u16, message: String },

    /// Retries were exhausted on 429, 5xx, or transport failures.
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The response body was not the JSON shape expected.
    #[error("unexpected response from {target}: {reason}")]
    Parse { target: String, reason: String },

    /// The request could not be built for this scope instance.
    #[error("cannot build request: {0}")]
    Request(#[from] nv_core::CoreError),
}

impl FetchError {
    /// HTTP status of a non-retryable rejection, if that is what this is.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotApplicable { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures that end discovery for an organization.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The credential was rejected.
    #[error("the API key was rejected (HTTP 401)")]
    Auth,

    /// The organization does not exist or is not visible to the credential.
    #[error("unknown organization '{org_id}' (HTTP {status})")]
    UnknownOrganization { org_id: String, status: u16 },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
