//! # nv-api
//!
//! Dashboard API access for netvault:
//! - [`RateLimiter`]: process-wide request pacing and in-flight cap
//! - [`Fetcher`]: retrying, paginating resource fetches over a [`Transport`]
//! - Hierarchy discovery ([`Fetcher::discover`], [`Fetcher::list_organizations`])
//! - [`HttpTransport`]: the reqwest transport; [`ScriptedTransport`] answers
//!   from an in-memory script

mod discover;
mod error;
mod fetcher;
mod http;
mod rate_limit;
mod scripted;
mod transport;

pub use error::{ApiError, DiscoverError, FetchError};
pub use fetcher::{FetchOptions, Fetcher, RetryPolicy};
pub use http::{ClientConfig, HttpTransport};
pub use rate_limit::{Permit, RateLimiter};
pub use scripted::ScriptedTransport;
pub use transport::{RawResponse, Transport, parse_next_link};
