use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cap_inventory::{Dimension, FleetRegistrySource, InventoryApi, InventoryError};
use cap_schemas::{
    Cluster, ClusterHost, FleetHost, Instance, InventorySnapshot, PatchRequest, Storage,
};

#[derive(Default)]
struct InventoryState {
    snapshot: InventorySnapshot,
    failing_dimension: Option<Dimension>,
    fail_patches: bool,
    dimension_calls: Vec<Dimension>,
    patch_attempts: Vec<PatchRequest>,
}

/// In-memory inventory service. Clones share state, so a test keeps one
/// handle and gives another to the loop.
#[derive(Clone, Default)]
pub struct FakeInventory {
    state: Arc<Mutex<InventoryState>>,
}

impl FakeInventory {
    pub fn new(snapshot: InventorySnapshot) -> Self {
        let fake = Self::default();
        fake.lock().snapshot = snapshot;
        fake
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads of `dimension` answer 503 from now on.
    pub fn fail_dimension(&self, dimension: Dimension) {
        self.lock().failing_dimension = Some(dimension);
    }

    /// Every patch answers 500 from now on. Attempts are still recorded.
    pub fn fail_patches(&self) {
        self.lock().fail_patches = true;
    }

    pub fn set_snapshot(&self, snapshot: InventorySnapshot) {
        self.lock().snapshot = snapshot;
    }

    /// Every dimension read so far, in call order.
    pub fn dimension_calls(&self) -> Vec<Dimension> {
        self.lock().dimension_calls.clone()
    }

    pub fn patch_attempts(&self) -> Vec<PatchRequest> {
        self.lock().patch_attempts.clone()
    }

    fn read<T: Clone>(
        &self,
        dimension: Dimension,
        pick: impl FnOnce(&InventorySnapshot) -> &Vec<T>,
    ) -> Result<Vec<T>, InventoryError> {
        let mut st = self.lock();
        st.dimension_calls.push(dimension);
        if st.failing_dimension == Some(dimension) {
            return Err(InventoryError::Status {
                endpoint: dimension.as_str().to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(pick(&st.snapshot).clone())
    }
}

#[async_trait::async_trait]
impl InventoryApi for FakeInventory {
    async fn clusters(&self) -> Result<Vec<Cluster>, InventoryError> {
        self.read(Dimension::Clusters, |s| &s.clusters)
    }

    async fn storages(&self) -> Result<Vec<Storage>, InventoryError> {
        self.read(Dimension::Storages, |s| &s.storages)
    }

    async fn instances(&self) -> Result<Vec<Instance>, InventoryError> {
        self.read(Dimension::Instances, |s| &s.instances)
    }

    async fn cluster_hosts(&self) -> Result<Vec<ClusterHost>, InventoryError> {
        self.read(Dimension::ClusterHosts, |s| &s.cluster_hosts)
    }

    async fn patch(&self, request: &PatchRequest) -> Result<(), InventoryError> {
        let mut st = self.lock();
        st.patch_attempts.push(request.clone());
        if st.fail_patches {
            return Err(InventoryError::Status {
                endpoint: format!("{}/{}", request.collection.as_str(), request.target_id),
                status: 500,
                body: "patch rejected".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fleet registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StaticFleet {
    hosts: Vec<FleetHost>,
}

impl StaticFleet {
    pub fn new(hosts: Vec<FleetHost>) -> Self {
        Self { hosts }
    }

    /// `(fqdn, id)` pairs.
    pub fn from_pairs(pairs: &[(&str, i64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(fqdn, id)| FleetHost {
                    fqdn: fqdn.to_string(),
                    id: *id,
                })
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl FleetRegistrySource for StaticFleet {
    async fn fetch_hosts(&self) -> Result<Vec<FleetHost>, InventoryError> {
        Ok(self.hosts.clone())
    }
}

/// Always fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct UnreachableFleet;

#[async_trait::async_trait]
impl FleetRegistrySource for UnreachableFleet {
    async fn fetch_hosts(&self) -> Result<Vec<FleetHost>, InventoryError> {
        Err(InventoryError::Transport {
            endpoint: "fleet-registry".to_string(),
            message: "connection refused".to_string(),
        })
    }
}
