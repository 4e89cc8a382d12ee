//! Hierarchy discovery: organization, networks, devices.

use std::collections::{HashMap, HashSet};

use nv_core::{Device, Hierarchy, Network, Organization};
use serde::Deserialize;

use crate::error::{DiscoverError, FetchError};
use crate::fetcher::Fetcher;
use crate::transport::Transport;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OrganizationWire {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkWire {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    product_types: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceWire {
    serial: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    network_id: Option<String>,
}

impl From<OrganizationWire> for Organization {
    fn from(w: OrganizationWire) -> Self {
        Self {
            id: w.id,
            name: w.name,
        }
    }
}

impl DeviceWire {
    fn into_device(self) -> Device {
        Device {
            name: self.name.filter(|n| !n.is_empty()).unwrap_or_default(),
            serial: self.serial,
            model: self.model,
            network_id: self.network_id,
        }
    }
}

// ── Discovery ──────────────────────────────────────────────────────

impl<T: Transport> Fetcher<T> {
    /// Organizations visible to the credential.
    ///
    /// # Errors
    ///
    /// [`DiscoverError::Auth`] on 401, [`DiscoverError::Fetch`] otherwise.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, DiscoverError> {
        let orgs: Vec<OrganizationWire> = self
            .get_as("/organizations", true)
            .await
            .map_err(auth_or_fetch)?;
        Ok(orgs.into_iter().map(Organization::from).collect())
    }

    /// Discover one organization's networks and devices.
    ///
    /// With `tag`, only networks carrying it and their devices are kept.
    ///
    /// # Errors
    ///
    /// - [`DiscoverError::Auth`] if the credential is rejected at any step
    /// - [`DiscoverError::UnknownOrganization`] on 403/404 for the organization
    /// - [`DiscoverError::Fetch`] if the organization or its networks cannot
    ///   be listed
    pub async fn discover(
        &self,
        org_id: &str,
        tag: Option<&str>,
    ) -> Result<Hierarchy, DiscoverError> {
        let org_path = format!("/organizations/{org_id}");
        let organization: Organization = self
            .get_as::<OrganizationWire>(&org_path, false)
            .await
            .map_err(|e| match e.status() {
                Some(401) => DiscoverError::Auth,
                Some(status @ (403 | 404)) => DiscoverError::UnknownOrganization {
                    org_id: org_id.to_string(),
                    status,
                },
                _ => DiscoverError::Fetch(e),
            })?
            .into();

        let networks: Vec<Network> = self
            .get_as::<Vec<NetworkWire>>(&format!("{org_path}/networks"), true)
            .await
            .map_err(auth_or_fetch)?
            .into_iter()
            .map(|w| Network {
                id: w.id,
                name: w.name,
                org_id: organization.id.clone(),
                product_types: w.product_types,
                tags: w.tags,
            })
            .collect();

        let mut warnings = Vec::new();
        let in_scope = |n: &Network| tag.is_none_or(|t| n.has_tag(t));

        let (devices, networks) = match self
            .get_as::<Vec<DeviceWire>>(&format!("{org_path}/devices"), true)
            .await
        {
            Ok(list) => (
                list.into_iter().map(DeviceWire::into_device).collect(),
                networks,
            ),
            Err(e) if e.status() == Some(401) => return Err(DiscoverError::Auth),
            Err(e) => {
                tracing::warn!(org_id, %e, "organization device listing failed, listing per network");
                warnings.push(format!(
                    "organization device listing failed ({e}); devices were listed per network"
                ));
                self.devices_per_network(networks, &in_scope, &mut warnings)
                    .await?
            }
        };

        let devices = reconcile_devices(devices, &networks, &mut warnings);
        let mut hierarchy = Hierarchy {
            organization,
            networks,
            devices,
            warnings,
        };
        if let Some(tag) = tag {
            hierarchy.retain_tagged(tag);
        }

        tracing::info!(
            org_id,
            networks = hierarchy.networks.len(),
            devices = hierarchy.devices.len(),
            warnings = hierarchy.warnings.len(),
            "discovered hierarchy"
        );
        Ok(hierarchy)
    }

    /// Fallback device listing. Networks whose listing fails are dropped
    /// from the returned network list together with their devices.
    async fn devices_per_network(
        &self,
        networks: Vec<Network>,
        in_scope: &impl Fn(&Network) -> bool,
        warnings: &mut Vec<String>,
    ) -> Result<(Vec<Device>, Vec<Network>), DiscoverError> {
        let mut devices = Vec::new();
        let mut kept = Vec::with_capacity(networks.len());
        for network in networks {
            if !in_scope(&network) {
                kept.push(network);
                continue;
            }
            let path = format!("/networks/{}/devices", network.id);
            match self.get_as::<Vec<DeviceWire>>(&path, false).await {
                Ok(list) => {
                    devices.extend(list.into_iter().map(|w| {
                        let mut device = w.into_device();
                        device.network_id.get_or_insert_with(|| network.id.clone());
                        device
                    }));
                    kept.push(network);
                }
                Err(e) if e.status() == Some(401) => return Err(DiscoverError::Auth),
                Err(e) => {
                    tracing::warn!(network_id = %network.id, %e, "network device listing failed");
                    warnings.push(format!(
                        "network {} excluded: device listing failed ({e})",
                        network.id
                    ));
                }
            }
        }
        Ok((devices, kept))
    }
}

/// Demote devices pointing at unknown networks to org-level and keep the
/// first occurrence of any serial listed more than once.
fn reconcile_devices(
    devices: Vec<Device>,
    networks: &[Network],
    warnings: &mut Vec<String>,
) -> Vec<Device> {
    let known: HashSet<&str> = networks.iter().map(|n| n.id.as_str()).collect();

    let mut seen_in: HashMap<String, Vec<String>> = HashMap::new();
    let mut order = Vec::new();
    let mut kept: Vec<Device> = Vec::new();

    for mut device in devices {
        let location = device
            .network_id
            .clone()
            .unwrap_or_else(|| "(no network)".to_string());
        if let Some(places) = seen_in.get_mut(&device.serial) {
            places.push(location);
            continue;
        }
        seen_in.insert(device.serial.clone(), vec![location]);
        order.push(device.serial.clone());

        if let Some(network_id) = device.network_id.as_deref() {
            if !known.contains(network_id) {
                warnings.push(format!(
                    "device {} references undiscovered network {network_id}; archived as an organization-level device",
                    device.serial
                ));
                device.network_id = None;
            }
        }
        kept.push(device);
    }

    for serial in order {
        if let Some(places) = seen_in.get(&serial) {
            if places.len() > 1 {
                warnings.push(format!(
                    "device {serial} is listed {} times (in {}); keeping the first",
                    places.len(),
                    places.join(", ")
                ));
            }
        }
    }
    kept
}

fn auth_or_fetch(e: FetchError) -> DiscoverError {
    if e.status() == Some(401) {
        DiscoverError::Auth
    } else {
        DiscoverError::Fetch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn net(id: &str) -> Network {
        Network {
            id: id.into(),
            name: id.into(),
            org_id: "o1".into(),
            product_types: vec![],
            tags: vec![],
        }
    }

    fn dev(serial: &str, network: Option<&str>) -> Device {
        Device {
            serial: serial.into(),
            name: String::new(),
            model: "MR46".into(),
            network_id: network.map(Into::into),
        }
    }

    #[test]
    fn orphan_devices_become_org_level() {
        let mut warnings = Vec::new();
        let out = reconcile_devices(vec![dev("S1", Some("N_gone"))], &[net("N1")], &mut warnings);
        assert_eq!(out[0].network_id, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("N_gone"));
    }

    #[test]
    fn duplicate_serials_keep_first_and_name_every_network() {
        let mut warnings = Vec::new();
        let out = reconcile_devices(
            vec![dev("S1", Some("N1")), dev("S2", Some("N1")), dev("S1", Some("N2"))],
            &[net("N1"), net("N2")],
            &mut warnings,
        );
        assert_eq!(
            out.iter().map(|d| d.serial.as_str()).collect::<Vec<_>>(),
            vec!["S1", "S2"]
        );
        assert_eq!(out[0].network_id.as_deref(), Some("N1"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("N1, N2"));
    }
}
