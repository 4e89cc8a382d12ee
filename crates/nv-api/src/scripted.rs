//! In-memory [`Transport`] that answers from a script.
//!
//! Routes map a target (path plus query, or absolute URL) to a standing
//! response. A queued sequence for a target is consumed first, which is how
//! tests express "fail twice, then succeed". Unknown targets answer 404.
//! A target can be slowed down with [`ScriptedTransport::delay`]; the
//! transport records completion order and the peak number of requests it
//! saw in flight.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::ApiError;
use crate::transport::{RawResponse, Transport};

type Reply = Result<RawResponse, ApiError>;

#[derive(Default)]
struct Script {
    routes: HashMap<String, RawResponse>,
    queued: HashMap<String, VecDeque<Reply>>,
    calls: HashMap<String, usize>,
    delays: HashMap<String, Duration>,
    completed: Vec<String>,
}

/// Cloning shares the script, so a test can keep a handle while the
/// fetcher owns another.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `target` with `response` from now on.
    pub fn route(&self, target: impl Into<String>, response: RawResponse) -> &Self {
        self.script().routes.insert(target.into(), response);
        self
    }

    /// Answer `target` with `body` as a 200 JSON response.
    pub fn route_json(&self, target: impl Into<String>, body: &serde_json::Value) -> &Self {
        self.route(target, RawResponse::json(body))
    }

    /// Answer the next calls to `target` with `replies`, in order, before
    /// falling back to its route.
    pub fn queue(&self, target: impl Into<String>, replies: Vec<Reply>) -> &Self {
        self.script()
            .queued
            .entry(target.into())
            .or_default()
            .extend(replies);
        self
    }

    /// Stop answering `target` (it will 404).
    pub fn remove(&self, target: &str) -> &Self {
        self.script().routes.remove(target);
        self
    }

    /// Hold every answer for `target` for `delay` before returning it.
    pub fn delay(&self, target: impl Into<String>, delay: Duration) -> &Self {
        self.script().delays.insert(target.into(), delay);
        self
    }

    /// Targets in the order their answers were returned.
    #[must_use]
    pub fn completed(&self) -> Vec<String> {
        self.script().completed.clone()
    }

    /// Most requests ever in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of GETs issued for `target`.
    #[must_use]
    pub fn calls(&self, target: &str) -> usize {
        self.script().calls.get(target).copied().unwrap_or(0)
    }

    /// Total GETs issued.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.script().calls.values().sum()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, target: &str) -> Result<RawResponse, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (reply, delay) = {
            let mut script = self.script();
            *script.calls.entry(target.to_string()).or_default() += 1;
            let queued = script.queued.get_mut(target).and_then(VecDeque::pop_front);
            let reply = queued.unwrap_or_else(|| {
                Ok(script.routes.get(target).cloned().unwrap_or_else(|| {
                    RawResponse::with_status(404, r#"{"errors":["Not found"]}"#)
                }))
            });
            (reply, script.delays.get(target).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.script().completed.push(target.to_string());
        reply
    }
}
