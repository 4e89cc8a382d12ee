//! Process-wide request pacing.
//!
//! Two limits apply to every outgoing request: a requests-per-second ceiling
//! (request *starts* are spaced at least `1 / rps` apart) and a cap on
//! requests in flight. Waiters queue FIFO on both, so no caller starves.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Shared limiter. Clone the `Arc` it lives in, never the limiter itself.
#[derive(Debug)]
pub struct RateLimiter {
    slots: Arc<Semaphore>,
    next_start: Mutex<Instant>,
    interval: Duration,
    max_in_flight: usize,
}

/// An in-flight slot. Dropping it frees the slot.
#[derive(Debug)]
#[must_use = "dropping the permit immediately frees the in-flight slot"]
pub struct Permit {
    _slot: Option<OwnedSemaphorePermit>,
}

impl Permit {
    /// Free the slot now instead of at end of scope.
    pub fn release(self) {}
}

impl RateLimiter {
    /// Build a limiter. Zero values are treated as one.
    #[must_use]
    pub fn new(requests_per_second: u32, max_in_flight: u32) -> Self {
        let rps = requests_per_second.max(1);
        let max_in_flight = max_in_flight.max(1) as usize;
        Self {
            slots: Arc::new(Semaphore::new(max_in_flight)),
            next_start: Mutex::new(Instant::now()),
            interval: Duration::from_secs(1) / rps,
            max_in_flight,
        }
    }

    /// Suspend until one more request may start.
    pub async fn acquire(&self) -> Permit {
        // Never closed; `None` would only mean no slot is held.
        let slot = Arc::clone(&self.slots).acquire_owned().await.ok();

        let start = {
            let mut next = self.next_start.lock().await;
            let start = (*next).max(Instant::now());
            *next = start + self.interval;
            start
        };
        tokio::time::sleep_until(start).await;

        Permit { _slot: slot }
    }

    /// Slots not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}
