//! Resource fetching with pacing, retry, and pagination.
//!
//! Every attempt (and every page) passes through the shared
//! [`RateLimiter`] before touching the network. 429, 5xx, and transport
//! failures back off exponentially, honouring `Retry-After`; any other
//! non-success status ends the fetch as not applicable.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use nv_config::LimitsConfig;
use nv_core::{EndpointDescriptor, Resource, ResourceId, ScopeInstance};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;
use crate::rate_limit::RateLimiter;
use crate::transport::{RawResponse, Transport};

/// Longest response excerpt kept in error messages.
const MAX_MESSAGE_LEN: usize = 200;

/// Retry behaviour for a single request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Backoff is capped here (a longer `Retry-After` still wins).
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            max_attempts: limits.max_attempts.max(1),
            base_delay: limits.base_delay(),
            max_delay: limits.max_delay(),
        }
    }

    /// Wait after failed attempt number `attempt` (1-based):
    /// `min(base * 2^(attempt-1), max)`, but never less than `retry_after`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        retry_after.map_or(backoff, |advised| backoff.max(advised))
    }
}

/// Knobs that shape requests rather than retries.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `perPage` sent with paginated requests.
    pub page_size: u32,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches resources over a [`Transport`], sharing one limiter with every
/// other fetcher in the process.
pub struct Fetcher<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    options: FetchOptions,
}

impl<T: Transport> Fetcher<T> {
    pub const fn new(transport: T, limiter: Arc<RateLimiter>, options: FetchOptions) -> Self {
        Self {
            transport,
            limiter,
            options,
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetch one (descriptor × scope instance) resource.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Request`] if the template has no value for this scope
    /// - [`FetchError::NotApplicable`] on a non-retryable 4xx
    /// - [`FetchError::Exhausted`] once retries run out
    /// - [`FetchError::Parse`] if a body is not JSON
    pub async fn fetch(
        &self,
        descriptor: &EndpointDescriptor,
        scope: &ScopeInstance,
    ) -> Result<Resource, FetchError> {
        let path = descriptor.path.render(scope)?;
        let body = self.get_json(&path, descriptor.paginated).await?;
        Ok(Resource {
            id: ResourceId::new(descriptor, scope),
            body,
        })
    }

    /// GET `path` as JSON, following `rel=next` links when `paginated`.
    ///
    /// Pages must be JSON arrays and are concatenated in order. A paginated
    /// endpoint that answers with a single non-array document is returned as is.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`], minus [`FetchError::Request`]. A `rel=next`
    /// link back to a page already fetched is a [`FetchError::Parse`].
    pub async fn get_json(&self, path: &str, paginated: bool) -> Result<Value, FetchError> {
        if !paginated {
            let resp = self.get_with_retry(path).await?;
            return parse_body(path, &resp.body);
        }

        let first_target = with_query(path, "perPage", &self.options.page_size.to_string());
        let first = self.get_with_retry(&first_target).await?;
        let mut next = first.next_link.clone();
        let mut items = match parse_body(&first_target, &first.body)? {
            Value::Array(items) => items,
            other if next.is_none() => return Ok(other),
            _ => {
                return Err(FetchError::Parse {
                    target: first_target,
                    reason: "paginated response is not a JSON array".into(),
                });
            }
        };

        let mut seen = HashSet::from([first_target]);
        let mut pages = 1u32;
        while let Some(target) = next.take() {
            if !seen.insert(target.clone()) {
                return Err(FetchError::Parse {
                    target,
                    reason: "pagination link points at a page already fetched".into(),
                });
            }
            let resp = self.get_with_retry(&target).await?;
            match parse_body(&target, &resp.body)? {
                Value::Array(more) => items.extend(more),
                _ => {
                    return Err(FetchError::Parse {
                        target,
                        reason: "paginated response is not a JSON array".into(),
                    });
                }
            }
            pages += 1;
            next = resp.next_link;
        }
        tracing::debug!(path, pages, items = items.len(), "fetched paginated resource");
        Ok(Value::Array(items))
    }

    /// [`Self::get_json`] deserialized into `D`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_json`], plus [`FetchError::Parse`] on a shape mismatch.
    pub async fn get_as<D: DeserializeOwned>(
        &self,
        path: &str,
        paginated: bool,
    ) -> Result<D, FetchError> {
        let value = self.get_json(path, paginated).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Parse {
            target: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// One logical request: limiter, GET, and retry until success or a
    /// terminal outcome.
    async fn get_with_retry(&self, target: &str) -> Result<RawResponse, FetchError> {
        let policy = &self.options.retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let permit = self.limiter.acquire().await;
            let outcome = self.transport.get(target).await;
            permit.release();

            let (reason, retry_after) = match outcome {
                Ok(resp) if resp.is_success() => return Ok(resp),
                Ok(resp) if resp.is_retryable() => (
                    format!("HTTP {}", resp.status),
                    resp.retry_after_secs.map(Duration::from_secs),
                ),
                Ok(resp) => {
                    return Err(FetchError::NotApplicable {
                        status: resp.status,
                        message: excerpt(&resp.body),
                    });
                }
                Err(e) => (e.to_string(), None),
            };

            if attempt >= policy.max_attempts {
                tracing::warn!(request = target, attempts = attempt, %reason, "giving up on request");
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last_error: reason,
                });
            }

            let delay = policy.delay_for(attempt, retry_after);
            tracing::debug!(request = target, attempt, ?delay, %reason, "retrying request");
            tokio::time::sleep(delay).await;
        }
    }
}

fn parse_body(target: &str, body: &str) -> Result<Value, FetchError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| FetchError::Parse {
        target: target.to_string(),
        reason: e.to_string(),
    })
}

fn with_query(path: &str, key: &str, value: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{key}={value}")
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4, None), Duration::from_secs(3));
        assert_eq!(policy.delay_for(40, None), Duration::from_secs(3));
    }

    #[test]
    fn retry_after_is_a_floor() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_millis(10))),
            Duration::from_millis(500)
        );
        // A server asking for more than max_delay is obeyed.
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn query_is_appended() {
        assert_eq!(with_query("/a", "perPage", "10"), "/a?perPage=10");
        assert_eq!(with_query("/a?x=1", "perPage", "10"), "/a?x=1&perPage=10");
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(parse_body("/x", "  ").unwrap(), Value::Null);
        assert!(parse_body("/x", "<html>").is_err());
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert!(short.chars().count() <= MAX_MESSAGE_LEN + 1);
        assert_eq!(excerpt(" ok "), "ok");
    }
}
