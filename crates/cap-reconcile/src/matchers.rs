//! Per-kind matchers.
//!
//! Every matcher is a linear scan returning the FIRST qualifying element in
//! snapshot order. The inventory does not guarantee unique natural keys, so
//! "first wins" is the lookup policy, not an assumption of uniqueness.

use cap_schemas::{
    Cluster, ClusterHost, ClusterHostTelemetry, ClusterTelemetry, DatastoreTelemetry, FleetRegistry,
    Instance, InventorySnapshot, Storage, VmTelemetry,
};

use crate::site::normalize_site;
use crate::types::Matched;

/// Only clusters with this profile take part in cluster-host reconciliation.
pub const RESOURCE_POOL_PROFILE: &str = "3x";

fn first_match<'a, T>(items: &'a [T], pred: impl Fn(&T) -> bool) -> Option<Matched<'a, T>> {
    items
        .iter()
        .enumerate()
        .find(|(_, item)| pred(item))
        .map(|(index, entry)| Matched { index, entry })
}

// ---------------------------------------------------------------------------
// Cluster / resource pool
// ---------------------------------------------------------------------------

/// Inventory key derived from one cluster telemetry element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterKey {
    /// `"CMS 3.x"` records: site, pod, datacenter and pool name.
    ResourcePool {
        site: String,
        pod: i64,
        datacenter: String,
        pool_name: String,
    },
    /// Every other version: site, datacenter and cluster name. Pod is not
    /// part of this key.
    Cluster {
        site: String,
        datacenter: String,
        cluster_name: String,
    },
}

impl ClusterKey {
    fn matches(&self, c: &Cluster) -> bool {
        match self {
            ClusterKey::ResourcePool {
                site,
                pod,
                datacenter,
                pool_name,
            } => {
                c.pool_location == *site
                    && c.pod == *pod
                    && c.datacenter == *datacenter
                    && c.resource_pool_name == *pool_name
            }
            ClusterKey::Cluster {
                site,
                datacenter,
                cluster_name,
            } => {
                c.pool_location == *site
                    && c.datacenter == *datacenter
                    && c.cluster_name == *cluster_name
            }
        }
    }
}

/// Build the lookup key, normalizing the site. Fails with the raw pod string
/// when a resource-pool record's pod is not an integer.
pub fn cluster_key(t: &ClusterTelemetry) -> Result<ClusterKey, String> {
    let site = normalize_site(&t.site);
    if t.is_resource_pool() {
        let pod = t.pod.parse::<i64>().map_err(|_| t.pod.clone())?;
        Ok(ClusterKey::ResourcePool {
            site,
            pod,
            datacenter: t.datacenter.clone(),
            pool_name: t.pool_name.clone(),
        })
    } else {
        Ok(ClusterKey::Cluster {
            site,
            datacenter: t.datacenter.clone(),
            cluster_name: t.esx_name.clone(),
        })
    }
}

pub fn find_cluster<'a>(key: &ClusterKey, clusters: &'a [Cluster]) -> Option<Matched<'a, Cluster>> {
    first_match(clusters, |c| key.matches(c))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterLookup<'a> {
    Found(Matched<'a, Cluster>),
    Miss,
    /// Pod parse failure. Treated as a miss, reported separately.
    PodUnparsable { raw: &'a str },
}

pub fn match_cluster<'a>(t: &'a ClusterTelemetry, snapshot: &'a InventorySnapshot) -> ClusterLookup<'a> {
    match cluster_key(t) {
        Ok(key) => match find_cluster(&key, &snapshot.clusters) {
            Some(m) => ClusterLookup::Found(m),
            None => ClusterLookup::Miss,
        },
        Err(_) => ClusterLookup::PodUnparsable { raw: &t.pod },
    }
}

// ---------------------------------------------------------------------------
// Datastore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageLookup<'a> {
    /// Name matched and a cluster at the record's site lists the storage.
    Found(Matched<'a, Storage>),
    NoStorage,
    /// Name matched but no cluster at the site lists it. Not appropriate.
    NotAtSite(Matched<'a, Storage>),
}

pub fn match_datastore<'a>(t: &DatastoreTelemetry, snapshot: &'a InventorySnapshot) -> StorageLookup<'a> {
    let Some(storage) = first_match(&snapshot.storages, |s| s.name == t.name) else {
        return StorageLookup::NoStorage;
    };

    let site = normalize_site(&t.site);
    let listed_at_site = snapshot
        .clusters
        .iter()
        .any(|c| c.pool_location == site && c.storage_ids.iter().any(|id| *id == storage.entry.id));

    if listed_at_site {
        StorageLookup::Found(storage)
    } else {
        StorageLookup::NotAtSite(storage)
    }
}

// ---------------------------------------------------------------------------
// Cluster host
// ---------------------------------------------------------------------------

/// Cluster owning a host: cluster name, datacenter, and the inventory's
/// integer pod rendered as decimal text compared to the telemetry pod.
pub fn find_cluster_for_host<'a>(
    t: &ClusterHostTelemetry,
    clusters: &'a [Cluster],
) -> Option<Matched<'a, Cluster>> {
    first_match(clusters, |c| {
        c.cluster_name == t.cluster_name && c.datacenter == t.datacenter && c.pod.to_string() == t.pod
    })
}

/// Hardware server id for a hostname, as decimal text.
pub fn find_server_id(hostname: &str, fleet: &FleetRegistry) -> Option<String> {
    fleet
        .hosts
        .iter()
        .find(|h| h.fqdn == hostname)
        .map(|h| h.id.to_string())
}

pub fn find_cluster_host<'a>(
    hostname: &str,
    hosts: &'a [ClusterHost],
) -> Option<Matched<'a, ClusterHost>> {
    first_match(hosts, |h| h.host_name == hostname)
}

// ---------------------------------------------------------------------------
// VM
// ---------------------------------------------------------------------------

pub fn find_instance<'a>(t: &VmTelemetry, instances: &'a [Instance]) -> Option<Matched<'a, Instance>> {
    first_match(instances, |i| i.hostname == t.name)
}
