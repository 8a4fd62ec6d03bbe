use cap_schemas::{
    Cluster, ClusterHost, FleetHost, Instance, InventorySnapshot, PatchRequest, Storage,
};

use crate::error::{InventoryError, SnapshotFetchError};

/// The four snapshot dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Clusters,
    Storages,
    Instances,
    ClusterHosts,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Clusters => "clusters",
            Dimension::Storages => "storages",
            Dimension::Instances => "instances",
            Dimension::ClusterHosts => "cluster_hosts",
        }
    }
}

/// Fleet-inventory service contract. Reads are idempotent.
#[async_trait::async_trait]
pub trait InventoryApi: Send + Sync {
    async fn clusters(&self) -> Result<Vec<Cluster>, InventoryError>;
    async fn storages(&self) -> Result<Vec<Storage>, InventoryError>;
    async fn instances(&self) -> Result<Vec<Instance>, InventoryError>;
    async fn cluster_hosts(&self) -> Result<Vec<ClusterHost>, InventoryError>;

    /// Submit all operations of `request` as one multi-op write.
    async fn patch(&self, request: &PatchRequest) -> Result<(), InventoryError>;
}

/// Hostname -> hardware server id source.
#[async_trait::async_trait]
pub trait FleetRegistrySource: Send + Sync {
    async fn fetch_hosts(&self) -> Result<Vec<FleetHost>, InventoryError>;
}

/// Fetch all four dimensions into one snapshot. Any failure fails the whole
/// snapshot; a partial snapshot is never returned.
pub async fn fetch_snapshot(api: &dyn InventoryApi) -> Result<InventorySnapshot, SnapshotFetchError> {
    let instances = api.instances().await.map_err(|source| SnapshotFetchError {
        dimension: Dimension::Instances,
        source,
    })?;
    let storages = api.storages().await.map_err(|source| SnapshotFetchError {
        dimension: Dimension::Storages,
        source,
    })?;
    let clusters = api.clusters().await.map_err(|source| SnapshotFetchError {
        dimension: Dimension::Clusters,
        source,
    })?;
    let cluster_hosts = api
        .cluster_hosts()
        .await
        .map_err(|source| SnapshotFetchError {
            dimension: Dimension::ClusterHosts,
            source,
        })?;

    tracing::debug!(
        clusters = clusters.len(),
        storages = storages.len(),
        instances = instances.len(),
        cluster_hosts = cluster_hosts.len(),
        "inventory snapshot fetched"
    );

    Ok(InventorySnapshot {
        clusters,
        storages,
        instances,
        cluster_hosts,
    })
}
