//! The seam between the fetcher and the network.

use std::future::Future;

use crate::error::ApiError;

/// What the fetcher needs from one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `Retry-After` in seconds, from either the numeric or the HTTP-date form.
    pub retry_after_secs: Option<u64>,
    /// Target of the `Link: <...>; rel=next` header.
    pub next_link: Option<String>,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    #[must_use]
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after_secs: None,
            next_link: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn next(mut self, link: impl Into<String>) -> Self {
        self.next_link = Some(link.into());
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// 429 and 5xx are worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

/// Issues a GET for a target, which is either a path relative to the API base
/// URL (`/organizations/1/networks?perPage=1000`) or an absolute URL taken
/// from a `Link` header.
pub trait Transport: Send + Sync {
    fn get(&self, target: &str) -> impl Future<Output = Result<RawResponse, ApiError>> + Send;
}

/// Parse an RFC 8288 `Link` header and return the `rel=next` target.
#[must_use]
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let part = part.trim();
        let open = part.find('<')?;
        let close = part[open..].find('>')? + open;
        let url = &part[open + 1..close];
        let is_next = part[close + 1..].split(';').any(|param| {
            let param = param.trim();
            param
                .strip_prefix("rel=")
                .map(|v| v.trim_matches('"'))
                .is_some_and(|v| v.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
        });
        is_next.then(|| url.to_string())
    })
}
