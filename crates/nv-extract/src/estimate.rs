//! Dry-run scan: discovery and planning only, nothing written.

use std::collections::BTreeMap;

use nv_api::{Fetcher, Transport};
use nv_core::{Catalog, ScopeKind};
use serde::Serialize;

use crate::error::ExtractError;
use crate::plan::FetchPlan;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanEstimate {
    pub org_id: String,
    pub org_name: String,
    pub networks: usize,
    pub devices: usize,
    /// Planned resource fetches. Pagination can add calls beyond this.
    pub calls: usize,
    pub calls_by_scope: BTreeMap<ScopeKind, usize>,
    /// Device count per family (`wireless`, `switch`, ...).
    pub device_families: BTreeMap<String, usize>,
    /// Network count per product type. A network with several product
    /// types counts once for each.
    pub network_products: BTreeMap<String, usize>,
    /// `calls / requests_per_second`.
    pub estimated_secs: f64,
    pub warnings: Vec<String>,
}

/// Discover `org_id` and plan its scan against `catalog` without fetching
/// any resource.
///
/// # Errors
///
/// [`ExtractError::Auth`] or [`ExtractError::Discover`] if discovery fails.
pub async fn estimate<T: Transport>(
    fetcher: &Fetcher<T>,
    catalog: &Catalog,
    org_id: &str,
    tag: Option<&str>,
    requests_per_second: u32,
) -> Result<ScanEstimate, ExtractError> {
    let hierarchy = fetcher.discover(org_id, tag).await?;
    let plan = FetchPlan::build(catalog, &hierarchy);

    let mut device_families = BTreeMap::new();
    for device in &hierarchy.devices {
        *device_families
            .entry(device.family().as_str().to_string())
            .or_insert(0) += 1;
    }
    let mut network_products = BTreeMap::new();
    for product in hierarchy.networks.iter().flat_map(|n| &n.product_types) {
        *network_products.entry(product.clone()).or_insert(0) += 1;
    }

    let calls = plan.len();
    #[allow(clippy::cast_precision_loss)]
    let estimated_secs = calls as f64 / f64::from(requests_per_second.max(1));

    Ok(ScanEstimate {
        org_id: hierarchy.organization.id.clone(),
        org_name: hierarchy.organization.name.clone(),
        networks: hierarchy.networks.len(),
        devices: hierarchy.devices.len(),
        calls,
        calls_by_scope: plan.count_by_scope(),
        device_families,
        network_products,
        estimated_secs,
        warnings: hierarchy.warnings,
    })
}
