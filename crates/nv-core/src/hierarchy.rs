//! The organization → network → device hierarchy as returned by discovery.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scope::ScopeInstance;

/// Root of one archive.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// A network inside an organization.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub org_id: String,
    /// Product types enabled on the network (`appliance`, `switch`, `wireless`, ...).
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Network {
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn scope(&self) -> ScopeInstance {
        ScopeInstance::Network {
            org_id: self.org_id.clone(),
            network_id: self.id.clone(),
        }
    }
}

/// A device, optionally bound to a network.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Device {
    pub serial: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    /// `None` for org-level-only devices.
    pub network_id: Option<String>,
}

impl Device {
    #[must_use]
    pub fn family(&self) -> DeviceFamily {
        DeviceFamily::from_model(&self.model)
    }

    #[must_use]
    pub fn scope(&self, org_id: &str) -> ScopeInstance {
        ScopeInstance::Device {
            org_id: org_id.to_string(),
            serial: self.serial.clone(),
            network_id: self.network_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceFamily
// ---------------------------------------------------------------------------

/// Product family derived from a device model prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DeviceFamily {
    Wireless,
    Switch,
    Appliance,
    Camera,
    CellularGateway,
    Sensor,
    Unknown,
}

impl DeviceFamily {
    /// Classify a model string such as `MR46`, `MS225-48LP`, or `vMX`.
    #[must_use]
    pub fn from_model(model: &str) -> Self {
        let upper = model.to_ascii_uppercase();
        if upper.starts_with("MR") {
            Self::Wireless
        } else if upper.starts_with("MS") {
            Self::Switch
        } else if upper.starts_with("MX")
            || upper.starts_with("VMX")
            || upper.starts_with("Z1")
            || upper.starts_with("Z3")
            || upper.starts_with("Z4")
        {
            Self::Appliance
        } else if upper.starts_with("MV") {
            Self::Camera
        } else if upper.starts_with("MG") {
            Self::CellularGateway
        } else if upper.starts_with("MT") {
            Self::Sensor
        } else {
            Self::Unknown
        }
    }

    /// The product-type string the API uses for this family.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wireless => "wireless",
            Self::Switch => "switch",
            Self::Appliance => "appliance",
            Self::Camera => "camera",
            Self::CellularGateway => "cellularGateway",
            Self::Sensor => "sensor",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

/// Everything discovery learned about one organization.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Hierarchy {
    pub organization: Organization,
    pub networks: Vec<Network>,
    pub devices: Vec<Device>,
    /// Non-fatal problems found while discovering (orphan devices, duplicate
    /// serials, networks whose device listing failed).
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Hierarchy {
    #[must_use]
    pub fn network(&self, id: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.id == id)
    }

    /// Keep only networks carrying `tag` and the devices bound to them.
    ///
    /// Org-level-only devices are dropped as well since they carry no tag.
    pub fn retain_tagged(&mut self, tag: &str) {
        self.networks.retain(|n| n.has_tag(tag));
        let kept: std::collections::HashSet<&str> =
            self.networks.iter().map(|n| n.id.as_str()).collect();
        self.devices.retain(|d| {
            d.network_id
                .as_deref()
                .is_some_and(|id| kept.contains(id))
        });
    }
}
