//! Resource identity and the archive path function.
//!
//! A resource path depends only on ids and the feature name, never on display
//! names, so renaming a network or device does not move its files.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::EndpointDescriptor;
use crate::scope::{ScopeInstance, ScopeKind};

/// Directory holding network-scoped resources under the settings root.
pub const NETWORKS_DIR: &str = "networks";
/// Directory holding device-scoped resources under the settings root.
pub const DEVICES_DIR: &str = "devices";

/// Identity of one stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct ResourceId {
    pub kind: ScopeKind,
    /// Organization id, network id, or device serial depending on `kind`.
    pub instance_id: String,
    pub feature: String,
}

impl ResourceId {
    #[must_use]
    pub fn new(descriptor: &EndpointDescriptor, scope: &ScopeInstance) -> Self {
        Self {
            kind: scope.kind(),
            instance_id: scope.instance_id().to_string(),
            feature: descriptor.feature.clone(),
        }
    }

    /// Path relative to the organization's `settings/` root.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        resource_path(self.kind, &self.instance_id, &self.feature)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.instance_id, self.feature)
    }
}

/// The JSON result of one endpoint call for one scope instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub body: serde_json::Value,
}

/// Deterministic path of a resource relative to the settings root:
/// `<Feature>.json`, `networks/<id>/<Feature>.json`, or
/// `devices/<serial>/<Feature>.json`.
#[must_use]
pub fn resource_path(kind: ScopeKind, instance_id: &str, feature: &str) -> PathBuf {
    let file = format!("{}.json", sanitize_component(feature));
    match kind {
        ScopeKind::Organization => PathBuf::from(file),
        ScopeKind::Network => [NETWORKS_DIR, &sanitize_component(instance_id), &file]
            .iter()
            .collect(),
        ScopeKind::Device => [DEVICES_DIR, &sanitize_component(instance_id), &file]
            .iter()
            .collect(),
    }
}

/// Scope kind a stored path belongs to, judged by its first component.
#[must_use]
pub fn scope_kind_of_path(path: &str) -> ScopeKind {
    match path.split('/').next() {
        Some(NETWORKS_DIR) if path.contains('/') => ScopeKind::Network,
        Some(DEVICES_DIR) if path.contains('/') => ScopeKind::Device,
        _ => ScopeKind::Organization,
    }
}

/// Keep `[A-Za-z0-9._-]`, replace anything else with `_`, and never yield an
/// empty or all-dots component.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}
