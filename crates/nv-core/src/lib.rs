//! # nv-core
//!
//! Core domain types shared by every netvault crate:
//! - The organization → network → device hierarchy
//! - Scope kinds and scope instances an endpoint is evaluated against
//! - The endpoint catalog (descriptors, path templates, applicability rules)
//! - Resource identity and the deterministic archive path function
//! - Scan records and revisions
//! - Cross-cutting error types

pub mod catalog;
pub mod errors;
pub mod hierarchy;
pub mod resource;
pub mod revision;
pub mod scan;
pub mod scope;

pub use catalog::{Catalog, EndpointDescriptor, PathTemplate, Placeholder};
pub use errors::CoreError;
pub use hierarchy::{Device, DeviceFamily, Hierarchy, Network, Organization};
pub use resource::{Resource, ResourceId, resource_path, scope_kind_of_path};
pub use revision::Revision;
pub use scan::{ResourceIssue, RunStatus, ScanRecord};
pub use scope::{ScopeInstance, ScopeKind};
