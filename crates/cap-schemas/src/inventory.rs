//! Inventory service records.
//!
//! All structs are container-level `#[serde(default)]`: the inventory service
//! omits empty attributes freely, and a missing attribute must read as the
//! zero value rather than fail the whole snapshot. Array attributes also
//! accept an explicit `null`.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage_ids: Vec<String>,
    pub resource_pool_name: String,
    pub vm_count: i64,
    pub pool_location: String,
    pub pod: i64,
    #[serde(rename = "dataCenterName")]
    pub datacenter: String,
    #[serde(rename = "cpuInUseByOpaas")]
    pub cpu_in_use: i64,
    #[serde(rename = "vCenterCPUConsumed")]
    pub vcenter_cpu_consumed: i64,
    #[serde(rename = "memoryInUseByOpaas")]
    pub memory_in_use: i64,
    #[serde(rename = "vCenterMemoryConsumed")]
    pub vcenter_memory_consumed: i64,
    pub profile: String,
    pub cluster_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub workload_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Storage {
    pub id: String,
    pub name: String,
    pub size_available: i64,
    pub size_free: i64,
    pub size_consumed: i64,
    pub size: i64,
    #[serde(rename = "inUseByOpaas")]
    pub in_use: i64,
    #[serde(rename = "vCenterSizeConsumed")]
    pub vcenter_size_consumed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceStorage {
    pub usage: String,
    pub size: i64,
    pub pool_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Instance {
    pub hostname: String,
    pub site: String,
    pub profile: String,
    /// Network block the instance was allocated from.
    pub cdir: String,
    pub resource_status: String,
    pub workload_type: String,
    pub request_id: String,
    pub memory: i64,
    pub cpu: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub storage: Vec<InstanceStorage>,
}

impl Instance {
    pub fn total_storage(&self) -> i64 {
        self.storage.iter().map(|s| s.size).sum()
    }

    /// Pool name of the first attached volume, empty when none is attached.
    pub fn first_pool_name(&self) -> &str {
        self.storage
            .first()
            .map(|s| s.pool_name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterHost {
    pub id: String,
    pub host_name: String,
    pub server_id: String,
    pub cluster_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub workload_types: Vec<String>,
}

/// The inventory's view of the fleet, fetched once per batch and shared
/// read-only by every record in it.
///
/// Collections keep the service's order. Natural keys are not unique in the
/// source data; lookups take the first match in this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    pub clusters: Vec<Cluster>,
    pub storages: Vec<Storage>,
    pub instances: Vec<Instance>,
    pub cluster_hosts: Vec<ClusterHost>,
}

// ---------------------------------------------------------------------------
// Fleet registry (hostname -> hardware server id)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetHost {
    #[serde(rename = "fullyQualifiedDomainName", default)]
    pub fqdn: String,
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetRegistry {
    pub hosts: Vec<FleetHost>,
}

impl FleetRegistry {
    pub fn new(hosts: Vec<FleetHost>) -> Self {
        Self { hosts }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
