//! Scope kinds and the concrete scope instances an endpoint is evaluated against.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ScopeKind
// ---------------------------------------------------------------------------

/// Level of the hierarchy an endpoint reads from.
///
/// The derived ordering (`Organization < Network < Device`) is the order in
/// which change-sets and reports list their entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Organization,
    Network,
    Device,
}

impl ScopeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Network => "network",
            Self::Device => "device",
        }
    }

    /// Plural label used for report section headings.
    #[must_use]
    pub const fn section_title(self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Network => "Networks",
            Self::Device => "Devices",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScopeInstance
// ---------------------------------------------------------------------------

/// One concrete organization, network, or device an endpoint is called for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ScopeInstance {
    Organization {
        org_id: String,
    },
    Network {
        org_id: String,
        network_id: String,
    },
    Device {
        org_id: String,
        serial: String,
        /// `None` for devices that are not bound to any network.
        network_id: Option<String>,
    },
}

impl ScopeInstance {
    #[must_use]
    pub const fn kind(&self) -> ScopeKind {
        match self {
            Self::Organization { .. } => ScopeKind::Organization,
            Self::Network { .. } => ScopeKind::Network,
            Self::Device { .. } => ScopeKind::Device,
        }
    }

    #[must_use]
    pub fn org_id(&self) -> &str {
        match self {
            Self::Organization { org_id }
            | Self::Network { org_id, .. }
            | Self::Device { org_id, .. } => org_id,
        }
    }

    /// The id that distinguishes this instance within its scope kind:
    /// the organization id, network id, or device serial.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        match self {
            Self::Organization { org_id } => org_id,
            Self::Network { network_id, .. } => network_id,
            Self::Device { serial, .. } => serial,
        }
    }

    #[must_use]
    pub fn network_id(&self) -> Option<&str> {
        match self {
            Self::Organization { .. } => None,
            Self::Network { network_id, .. } => Some(network_id),
            Self::Device { network_id, .. } => network_id.as_deref(),
        }
    }
}

impl fmt::Display for ScopeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.instance_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_kind_orders_organization_first() {
        let mut kinds = vec![ScopeKind::Device, ScopeKind::Organization, ScopeKind::Network];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![ScopeKind::Organization, ScopeKind::Network, ScopeKind::Device]
        );
    }

    #[test]
    fn scope_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScopeKind::Network).unwrap();
        assert_eq!(json, "\"network\"");
        let back: ScopeKind = serde_json::from_str("\"device\"").unwrap();
        assert_eq!(back, ScopeKind::Device);
    }

    #[test]
    fn instance_accessors() {
        let device = ScopeInstance::Device {
            org_id: "o1".into(),
            serial: "Q2XX-AAAA-BBBB".into(),
            network_id: None,
        };
        assert_eq!(device.kind(), ScopeKind::Device);
        assert_eq!(device.org_id(), "o1");
        assert_eq!(device.instance_id(), "Q2XX-AAAA-BBBB");
        assert_eq!(device.network_id(), None);
        assert_eq!(device.to_string(), "device Q2XX-AAAA-BBBB");

        let network = ScopeInstance::Network {
            org_id: "o1".into(),
            network_id: "N_1".into(),
        };
        assert_eq!(network.network_id(), Some("N_1"));
        assert_eq!(network.instance_id(), "N_1");
    }
}
