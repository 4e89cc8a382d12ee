//! reqwest-backed [`Transport`].
//!
//! The client configuration is built once and handed in; nothing about the
//! session lives in globals.

use std::time::Duration;

use chrono::{DateTime, Utc};
use nv_config::{ApiKey, NetvaultConfig};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};

use crate::error::ApiError;
use crate::transport::{RawResponse, Transport, parse_next_link};

/// Everything needed to talk to the dashboard API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    #[must_use]
    pub fn from_config(config: &NetvaultConfig, api_key: ApiKey) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            api_key,
            timeout: config.api.timeout(),
            user_agent: config.api.user_agent.clone(),
        }
    }
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the client with bearer auth and JSON accept headers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the key is not a valid header value and
    /// [`ApiError::Http`] if the client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose()))
            .map_err(|_| ApiError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}{target}", self.base_url)
        }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, target: &str) -> Result<RawResponse, ApiError> {
        let url = self.url_for(target);
        tracing::trace!(%url, "GET");
        let resp = self.http.get(&url).send().await?;
        into_raw(resp).await
    }
}

/// Read the status, pacing and paging headers, and body.
async fn into_raw(resp: reqwest::Response) -> Result<RawResponse, ApiError> {
    let status = resp.status().as_u16();
    let retry_after_secs = parse_retry_after(&resp);
    let next_link = resp
        .headers()
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_next_link);
    let body = resp.text().await?;
    Ok(RawResponse {
        status,
        retry_after_secs,
        next_link,
        body,
    })
}

/// Parse the `Retry-After` header as whole seconds.
fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| retry_after_delay(v, Utc::now()))
}

/// `Retry-After` is either delta-seconds or an HTTP-date. A date in the past
/// means "now".
fn retry_after_delay(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - now;
    Some(u64::try_from(wait.num_seconds()).unwrap_or(0))
}
