//! # nv-extract
//!
//! Turns a discovered hierarchy and an endpoint catalog into a scan:
//! - [`FetchPlan`]: every (descriptor × applicable scope instance)
//! - [`Scheduler`]: bounded worker pool that fetches, writes, commits, and
//!   logs one organization
//! - [`estimate`]: the same discovery and planning with no fetches or writes

mod error;
mod estimate;
mod plan;
mod scheduler;

pub use error::ExtractError;
pub use estimate::{ScanEstimate, estimate};
pub use plan::{FetchJob, FetchPlan};
pub use scheduler::{NoProgress, ScanProgress, ScanSettings, Scheduler};
