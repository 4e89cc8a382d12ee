//! Fetch planning: every (descriptor × applicable scope instance).

use std::collections::BTreeMap;
use std::sync::Arc;

use nv_core::{Catalog, EndpointDescriptor, Hierarchy, ResourceId, ScopeInstance, ScopeKind};

/// One unit of work for a fetch worker.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub descriptor: Arc<EndpointDescriptor>,
    pub scope: ScopeInstance,
}

impl FetchJob {
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(&self.descriptor, &self.scope)
    }
}

/// Organization jobs first, then networks, then devices, each in catalog
/// order and hierarchy order.
#[derive(Debug, Clone, Default)]
pub struct FetchPlan {
    pub jobs: Vec<FetchJob>,
}

impl FetchPlan {
    #[must_use]
    pub fn build(catalog: &Catalog, hierarchy: &Hierarchy) -> Self {
        let org_id = hierarchy.organization.id.as_str();
        let mut jobs = Vec::new();

        for descriptor in catalog.for_scope(ScopeKind::Organization) {
            jobs.push(FetchJob {
                descriptor: Arc::new(descriptor.clone()),
                scope: ScopeInstance::Organization {
                    org_id: org_id.to_string(),
                },
            });
        }

        for descriptor in catalog.for_scope(ScopeKind::Network) {
            let descriptor = Arc::new(descriptor.clone());
            for network in &hierarchy.networks {
                if descriptor.applies_to_network(network) {
                    jobs.push(FetchJob {
                        descriptor: Arc::clone(&descriptor),
                        scope: network.scope(),
                    });
                }
            }
        }

        for descriptor in catalog.for_scope(ScopeKind::Device) {
            let descriptor = Arc::new(descriptor.clone());
            for device in &hierarchy.devices {
                if descriptor.applies_to_device(device) {
                    jobs.push(FetchJob {
                        descriptor: Arc::clone(&descriptor),
                        scope: device.scope(org_id),
                    });
                }
            }
        }

        Self { jobs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    #[must_use]
    pub fn count_by_scope(&self) -> BTreeMap<ScopeKind, usize> {
        let mut counts = BTreeMap::new();
        for job in &self.jobs {
            *counts.entry(job.scope.kind()).or_insert(0) += 1;
        }
        counts
    }
}
