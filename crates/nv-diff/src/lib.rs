//! # nv-diff
//!
//! Compares two revisions of an organization's snapshot history.
//! [`diff`] classifies every differing path as added, removed, or modified;
//! modified JSON resources carry a field-level [`Delta`].

mod delta;
mod engine;
mod error;

pub use delta::{Delta, FieldChange, structural};
pub use engine::{ChangeSet, ChangeStatus, PathChange, diff, diff_revisions};
pub use error::DiffError;
