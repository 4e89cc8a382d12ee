//! Request pacing, concurrency, and retry settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_max_in_flight() -> u32 {
    10
}

const fn default_workers() -> u32 {
    3
}

const fn default_max_attempts() -> u32 {
    4
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Ceiling on requests started per second, shared by every organization.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Ceiling on concurrently outstanding requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: u32,

    /// Fetch workers per scan. Clamped to `max_in_flight`.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            max_in_flight: default_max_in_flight(),
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl LimitsConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Worker count after clamping to the in-flight ceiling.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers.clamp(1, self.max_in_flight.max(1)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = LimitsConfig::default();
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.max_in_flight, 10);
        assert_eq!(config.workers, 3);
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.base_delay(), Duration::from_millis(500));
        assert_eq!(config.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn workers_are_clamped_to_in_flight() {
        let config = LimitsConfig {
            workers: 16,
            max_in_flight: 4,
            ..LimitsConfig::default()
        };
        assert_eq!(config.effective_workers(), 4);

        let zero = LimitsConfig {
            workers: 0,
            ..LimitsConfig::default()
        };
        assert_eq!(zero.effective_workers(), 1);
    }
}
