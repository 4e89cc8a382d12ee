//! The endpoint catalog: which read endpoints exist, at which scope, and where
//! their results land in the archive.
//!
//! The catalog is a TOML file of `[[endpoint]]` tables:
//!
//! ```toml
//! [[endpoint]]
//! scope = "network"
//! feature = "FirmwareUpgrades"
//! path = "/networks/{networkId}/firmwareUpgrades"
//! product_types = ["appliance", "switch"]
//! ```
//!
//! Adding an endpoint is a data change. Templates are checked when the
//! catalog loads so a scan never discovers a bad placeholder mid-flight.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::hierarchy::{Device, Network};
use crate::scope::{ScopeInstance, ScopeKind};

// ── Path templates ─────────────────────────────────────────────────────────

/// A placeholder a request template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    OrganizationId,
    NetworkId,
    Serial,
}

impl Placeholder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrganizationId => "organizationId",
            Self::NetworkId => "networkId",
            Self::Serial => "serial",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "organizationId" => Some(Self::OrganizationId),
            "networkId" => Some(Self::NetworkId),
            "serial" => Some(Self::Serial),
            _ => None,
        }
    }

    /// Whether this placeholder can have a value at `scope`.
    #[must_use]
    pub const fn available_at(self, scope: ScopeKind) -> bool {
        match self {
            Self::OrganizationId => true,
            Self::NetworkId => matches!(scope, ScopeKind::Network | ScopeKind::Device),
            Self::Serial => matches!(scope, ScopeKind::Device),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A request path such as `/networks/{networkId}/appliance/vlans`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.placeholders().any(|p| p == placeholder)
    }

    /// Substitute the scope instance's ids into the template, percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPlaceholder`] when the instance has no value
    /// for a referenced placeholder (e.g. `{networkId}` on an unbound device).
    pub fn render(&self, scope: &ScopeInstance) -> Result<String, CoreError> {
        let mut out = String::with_capacity(self.raw.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => {
                    let value = match (p, scope) {
                        (Placeholder::OrganizationId, _) => Some(scope.org_id()),
                        (Placeholder::NetworkId, _) => scope.network_id(),
                        (Placeholder::Serial, ScopeInstance::Device { serial, .. }) => {
                            Some(serial.as_str())
                        }
                        (Placeholder::Serial, _) => None,
                    };
                    let value = value.ok_or(CoreError::MissingPlaceholder {
                        placeholder: p.as_str(),
                        scope: scope.kind().as_str(),
                    })?;
                    out.push_str(&urlencoding::encode(value));
                }
            }
        }
        Ok(out)
    }
}

impl TryFrom<String> for PathTemplate {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| CoreError::InvalidTemplate {
            template: raw.clone(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut rest = raw.as_str();
        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(invalid("unbalanced '}'"));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let name = &after[..close];
            let placeholder = Placeholder::parse(name)
                .ok_or_else(|| invalid(&format!("unknown placeholder {{{name}}}")))?;
            segments.push(Segment::Placeholder(placeholder));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { raw, segments })
    }
}

impl From<PathTemplate> for String {
    fn from(template: PathTemplate) -> Self {
        template.raw
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Descriptors ────────────────────────────────────────────────────────────

/// One catalog entry: a read endpoint at a given scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointDescriptor {
    pub scope: ScopeKind,
    /// File stem of the stored resource, e.g. `FirmwareUpgrades`.
    pub feature: String,
    /// Request path relative to the API base URL.
    #[schemars(with = "String")]
    pub path: PathTemplate,
    /// Follow `Link: rel=next` and concatenate pages.
    #[serde(default)]
    pub paginated: bool,
    /// Restrict to networks with one of these product types, or to devices
    /// of one of these families. Empty means everywhere.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_types: Vec<String>,
}

impl EndpointDescriptor {
    #[must_use]
    pub fn applies_to_network(&self, network: &Network) -> bool {
        self.product_types.is_empty()
            || network
                .product_types
                .iter()
                .any(|p| self.product_types.contains(p))
    }

    #[must_use]
    pub fn applies_to_device(&self, device: &Device) -> bool {
        if self.path.uses(Placeholder::NetworkId) && device.network_id.is_none() {
            return false;
        }
        self.product_types.is_empty()
            || self
                .product_types
                .iter()
                .any(|p| p == device.family().as_str())
    }

    fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: String| CoreError::InvalidDescriptor {
            feature: self.feature.clone(),
            reason,
        };

        if self.feature.is_empty() {
            return Err(invalid("feature name is empty".into()));
        }
        if !self
            .feature
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "feature name may only contain ASCII letters, digits, '_' and '-'".into(),
            ));
        }
        if let Some(p) = self.path.placeholders().find(|p| !p.available_at(self.scope)) {
            return Err(invalid(format!(
                "placeholder {{{}}} is not available at {} scope",
                p.as_str(),
                self.scope
            )));
        }
        Ok(())
    }
}

// ── Catalog ────────────────────────────────────────────────────────────────

/// The full endpoint catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    #[serde(rename = "endpoint", default)]
    pub endpoints: Vec<EndpointDescriptor>,
}

impl Catalog {
    /// Read and validate a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CatalogIo`] if the file cannot be read, or any
    /// error from [`Catalog::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate catalog TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CatalogParse`] for malformed TOML or templates and
    /// [`CoreError::InvalidDescriptor`] for rule violations.
    pub fn from_toml_str(text: &str) -> Result<Self, CoreError> {
        let catalog: Self = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check feature names, placeholder availability, and `(scope, feature)`
    /// uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoreError::InvalidDescriptor`] found.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for descriptor in &self.endpoints {
            descriptor.validate()?;
            if !seen.insert((descriptor.scope, descriptor.feature.as_str())) {
                return Err(CoreError::InvalidDescriptor {
                    feature: descriptor.feature.clone(),
                    reason: format!("duplicate feature at {} scope", descriptor.scope),
                });
            }
        }
        Ok(())
    }

    pub fn for_scope(&self, scope: ScopeKind) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter().filter(move |d| d.scope == scope)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn template(s: &str) -> PathTemplate {
        PathTemplate::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn render_substitutes_placeholders() {
        let t = template("/organizations/{organizationId}/networks/{networkId}/x");
        let scope = ScopeInstance::Network {
            org_id: "o1".into(),
            network_id: "N_9".into(),
        };
        assert_eq!(t.render(&scope).unwrap(), "/organizations/o1/networks/N_9/x");
    }

    #[test]
    fn render_reports_missing_network_for_unbound_device() {
        let t = template("/networks/{networkId}/devices/{serial}");
        let scope = ScopeInstance::Device {
            org_id: "o1".into(),
            serial: "S1".into(),
            network_id: None,
        };
        let err = t.render(&scope).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingPlaceholder {
                placeholder: "networkId",
                ..
            }
        ));
    }

    #[rstest]
    #[case("organizations/{organizationId}")]
    #[case("/organizations/{orgId}")]
    #[case("/organizations/{organizationId")]
    #[case("/organizations/organizationId}")]
    fn malformed_templates_are_rejected(#[case] raw: &str) {
        assert!(PathTemplate::try_from(raw.to_string()).is_err());
    }

    const GOOD: &str = r#"
[[endpoint]]
scope = "organization"
feature = "Admins"
path = "/organizations/{organizationId}/admins"

[[endpoint]]
scope = "network"
feature = "Vlans"
path = "/networks/{networkId}/appliance/vlans"
product_types = ["appliance"]

[[endpoint]]
scope = "device"
feature = "SwitchPorts"
path = "/devices/{serial}/switch/ports"
paginated = true
product_types = ["switch"]
"#;

    #[test]
    fn parses_catalog() {
        let catalog = Catalog::from_toml_str(GOOD).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.for_scope(ScopeKind::Network).count(), 1);
        let ports = &catalog.endpoints[2];
        assert!(ports.paginated);
        assert_eq!(ports.path.as_str(), "/devices/{serial}/switch/ports");
    }

    #[test]
    fn rejects_placeholder_outside_scope() {
        let text = r#"
[[endpoint]]
scope = "organization"
feature = "Bad"
path = "/networks/{networkId}/x"
"#;
        let err = Catalog::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("not available at organization scope"));
    }

    #[test]
    fn rejects_duplicate_feature_in_scope() {
        let text = r#"
[[endpoint]]
scope = "network"
feature = "Vlans"
path = "/networks/{networkId}/a"

[[endpoint]]
scope = "network"
feature = "Vlans"
path = "/networks/{networkId}/b"
"#;
        let err = Catalog::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_unsafe_feature_name() {
        let text = r#"
[[endpoint]]
scope = "organization"
feature = "../escape"
path = "/organizations/{organizationId}"
"#;
        assert!(Catalog::from_toml_str(text).is_err());
    }

    #[test]
    fn applicability_filters() {
        let catalog = Catalog::from_toml_str(GOOD).unwrap();
        let vlans = &catalog.endpoints[1];
        let ports = &catalog.endpoints[2];

        let wireless_net = Network {
            id: "N1".into(),
            name: "n".into(),
            org_id: "o1".into(),
            product_types: vec!["wireless".into()],
            tags: vec![],
        };
        let mixed_net = Network {
            product_types: vec!["wireless".into(), "appliance".into()],
            ..wireless_net.clone()
        };
        assert!(!vlans.applies_to_network(&wireless_net));
        assert!(vlans.applies_to_network(&mixed_net));

        let switch = Device {
            serial: "S1".into(),
            name: "sw".into(),
            model: "MS120-8".into(),
            network_id: Some("N1".into()),
        };
        let ap = Device {
            model: "MR36".into(),
            ..switch.clone()
        };
        assert!(ports.applies_to_device(&switch));
        assert!(!ports.applies_to_device(&ap));
    }

    #[test]
    fn catalog_schema_mentions_endpoint() {
        let schema = schemars::schema_for!(Catalog);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("endpoint"));
    }
}
