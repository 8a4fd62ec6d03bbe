use cap_schemas::{
    ClusterHostTelemetry, ClusterTelemetry, DatastoreTelemetry, FleetRegistry, InventorySnapshot,
    StreamKind, TelemetryRecord, VmTelemetry,
};

use crate::matchers::{
    find_cluster_for_host, find_cluster_host, find_instance, find_server_id, match_cluster,
    match_datastore, ClusterLookup, StorageLookup, RESOURCE_POOL_PROFILE,
};
use crate::notification::Notification;
use crate::policy::{cluster_patch, storage_patch};
use crate::report::{ClusterHostRow, ClusterRow, DatastoreRow, ReportRow, VmRow};
use crate::site::normalize_site;
use crate::types::{ItemOutcome, ItemStatus, MissReason, RecordOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Emit a capacity notification for every matched cluster.
    pub capacity_alerts: bool,
}

/// Everything a record is reconciled against. Built once per batch.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub snapshot: &'a InventorySnapshot,
    pub fleet: &'a FleetRegistry,
    pub options: &'a ReconcileOptions,
}

/// Reconcile every element of one stream record.
///
/// Pure: identical inputs give identical outcomes.
pub fn reconcile_record(record: &TelemetryRecord, ctx: &ReconcileContext<'_>) -> RecordOutcome {
    let items = match record {
        TelemetryRecord::Cluster { stream, data } => data
            .iter()
            .map(|t| reconcile_cluster(*stream, t, ctx))
            .collect(),
        TelemetryRecord::ClusterHost { data } => {
            data.iter().map(|t| reconcile_cluster_host(t, ctx)).collect()
        }
        TelemetryRecord::Datastore { data } => {
            data.iter().map(|t| reconcile_datastore(t, ctx)).collect()
        }
        TelemetryRecord::Vm { data } => data.iter().map(|t| reconcile_vm(t, ctx)).collect(),
    };

    RecordOutcome {
        kind: record.kind(),
        stream: record.stream(),
        items,
    }
}

// ---------------------------------------------------------------------------
// Cluster / resource pool
// ---------------------------------------------------------------------------

fn reconcile_cluster(stream: StreamKind, t: &ClusterTelemetry, ctx: &ReconcileContext<'_>) -> ItemOutcome {
    let subject = if t.is_resource_pool() {
        t.pool_name.clone()
    } else {
        t.esx_name.clone()
    };

    // resource_pool stream carries only 3.x pools; esx_cluster only the rest.
    let on_right_stream = match stream {
        StreamKind::ResourcePool => t.is_resource_pool(),
        _ => !t.is_resource_pool(),
    };
    if !on_right_stream {
        return ItemOutcome {
            subject,
            status: ItemStatus::WrongStream {
                version: t.version.clone(),
            },
            patch: None,
            notifications: Vec::new(),
            row: None,
        };
    }

    let mut row = ClusterRow {
        flavor: if t.is_resource_pool() {
            "resource_pool"
        } else {
            "cluster"
        },
        name: subject.clone(),
        pod: t.pod.clone(),
        site: normalize_site(&t.site),
        datacenter: t.datacenter.clone(),
        cpu_total: t.cpu_total,
        cpu_requested: t.cpu_requested,
        memory_total: t.memory_total,
        memory_requested: t.memory_requested,
        cluster_id: String::new(),
        cpu_in_use: None,
        vcenter_cpu_consumed: None,
        memory_in_use: None,
        vcenter_memory_consumed: None,
        patched: String::new(),
    };

    let matched = match match_cluster(t, ctx.snapshot) {
        ClusterLookup::Found(m) => m,
        ClusterLookup::Miss => {
            return miss(subject, MissReason::NoCluster, ReportRow::Cluster(row));
        }
        ClusterLookup::PodUnparsable { raw } => {
            let reason = MissReason::PodUnparsable {
                raw: raw.to_string(),
            };
            return miss(subject, reason, ReportRow::Cluster(row));
        }
    };
    let cluster = matched.entry;

    let patch = cluster_patch(t, cluster);

    row.cluster_id = cluster.id.clone();
    row.cpu_in_use = Some(cluster.cpu_in_use);
    row.vcenter_cpu_consumed = Some(cluster.vcenter_cpu_consumed);
    row.memory_in_use = Some(cluster.memory_in_use);
    row.vcenter_memory_consumed = Some(cluster.vcenter_memory_consumed);
    if let Some(p) = &patch {
        row.patched = p.paths().join(";");
    }

    let mut notifications = Vec::new();
    if ctx.options.capacity_alerts {
        notifications.push(Notification::ClusterCapacity {
            cluster_name: t.esx_name.clone(),
            pool_name: t.pool_name.clone(),
            pod: t.pod.clone(),
            datacenter: t.datacenter.clone(),
            site: normalize_site(&t.site),
            cpu_requested_pct: t.cpu_requested_pct,
            cpu_available_pct: t.cpu_available_pct,
            memory_requested_pct: t.memory_requested_pct,
            memory_available_pct: t.memory_available_pct,
            profile: cluster.profile.clone(),
        });
    }

    ItemOutcome {
        subject,
        status: ItemStatus::Matched {
            inventory_id: cluster.id.clone(),
        },
        patch,
        notifications,
        row: Some(ReportRow::Cluster(row)),
    }
}

// ---------------------------------------------------------------------------
// Datastore
// ---------------------------------------------------------------------------

fn reconcile_datastore(t: &DatastoreTelemetry, ctx: &ReconcileContext<'_>) -> ItemOutcome {
    let mut row = DatastoreRow {
        name: t.name.clone(),
        site: normalize_site(&t.site),
        total_gb: t.total_gb,
        requested_gb: t.requested_gb,
        committed_gb: t.committed_gb,
        size: None,
        size_consumed: None,
        size_free: None,
    };

    let storage = match match_datastore(t, ctx.snapshot) {
        StorageLookup::Found(m) => m.entry,
        StorageLookup::NoStorage => {
            return miss(t.name.clone(), MissReason::NoStorage, ReportRow::Datastore(row));
        }
        StorageLookup::NotAtSite(m) => {
            let reason = MissReason::StorageNotAtSite {
                storage_id: m.entry.id.clone(),
            };
            return miss(t.name.clone(), reason, ReportRow::Datastore(row));
        }
    };

    row.size = Some(storage.size);
    row.size_consumed = Some(storage.size_consumed);
    row.size_free = Some(storage.size_free);

    ItemOutcome {
        subject: t.name.clone(),
        status: ItemStatus::Matched {
            inventory_id: storage.id.clone(),
        },
        patch: storage_patch(t, storage),
        notifications: Vec::new(),
        row: Some(ReportRow::Datastore(row)),
    }
}

// ---------------------------------------------------------------------------
// Cluster host
// ---------------------------------------------------------------------------

fn reconcile_cluster_host(t: &ClusterHostTelemetry, ctx: &ReconcileContext<'_>) -> ItemOutcome {
    let mut row = ClusterHostRow {
        hostname: t.hostname.clone(),
        cluster_name: t.cluster_name.clone(),
        pod: t.pod.clone(),
        datacenter: t.datacenter.clone(),
        cluster_id: String::new(),
        profile: String::new(),
        server_id: String::new(),
        stored_server_id: String::new(),
        outcome: String::new(),
    };

    let Some(matched) = find_cluster_for_host(t, &ctx.snapshot.clusters) else {
        row.outcome = MissReason::NoCluster.as_str().to_string();
        return miss(t.hostname.clone(), MissReason::NoCluster, ReportRow::ClusterHost(row));
    };
    let cluster = matched.entry;
    row.cluster_id = cluster.id.clone();
    row.profile = cluster.profile.clone();

    if cluster.profile != RESOURCE_POOL_PROFILE {
        row.outcome = "ineligible_profile".to_string();
        return ItemOutcome {
            subject: t.hostname.clone(),
            status: ItemStatus::Ineligible {
                inventory_id: cluster.id.clone(),
                profile: cluster.profile.clone(),
            },
            patch: None,
            notifications: Vec::new(),
            row: Some(ReportRow::ClusterHost(row)),
        };
    }

    let Some(server_id) = find_server_id(&t.hostname, ctx.fleet) else {
        row.outcome = MissReason::NotInFleetRegistry.as_str().to_string();
        return miss(
            t.hostname.clone(),
            MissReason::NotInFleetRegistry,
            ReportRow::ClusterHost(row),
        );
    };
    row.server_id = server_id.clone();

    let mut notifications = Vec::new();
    match find_cluster_host(&t.hostname, &ctx.snapshot.cluster_hosts) {
        None => {
            // Creating the host record is not automated; operators are told.
            row.outcome = "new_host".to_string();
            notifications.push(Notification::NewClusterHost {
                hostname: t.hostname.clone(),
                server_id,
                cluster_id: cluster.id.clone(),
                workload_types: cluster.workload_types.clone(),
                profile: cluster.profile.clone(),
            });
        }
        Some(existing) if existing.entry.server_id != server_id => {
            row.stored_server_id = existing.entry.server_id.clone();
            row.outcome = "server_id_changed".to_string();
            notifications.push(Notification::ServerIdChanged {
                hostname: existing.entry.host_name.clone(),
                server_id,
                previous_server_id: existing.entry.server_id.clone(),
                profile: cluster.profile.clone(),
            });
        }
        Some(existing) => {
            row.stored_server_id = existing.entry.server_id.clone();
            row.outcome = "in_sync".to_string();
        }
    }

    ItemOutcome {
        subject: t.hostname.clone(),
        status: ItemStatus::Matched {
            inventory_id: cluster.id.clone(),
        },
        patch: None,
        notifications,
        row: Some(ReportRow::ClusterHost(row)),
    }
}

// ---------------------------------------------------------------------------
// VM
// ---------------------------------------------------------------------------

fn reconcile_vm(t: &VmTelemetry, ctx: &ReconcileContext<'_>) -> ItemOutcome {
    let mut row = VmRow {
        hostname: t.name.clone(),
        site: normalize_site(&t.site),
        vcenter_cpu: t.cpu,
        memory_requested_gb: t.memory_requested_gb,
        storage_requested_gb: t.storage_requested_gb,
        profile: String::new(),
        cdir: String::new(),
        resource_status: String::new(),
        workload_type: String::new(),
        request_id: String::new(),
        storage_pool_name: String::new(),
        memory: None,
        cpu: None,
        storage: None,
    };

    let Some(matched) = find_instance(t, &ctx.snapshot.instances) else {
        return miss(t.name.clone(), MissReason::NoInstance, ReportRow::Vm(row));
    };
    let instance = matched.entry;

    row.profile = instance.profile.clone();
    row.cdir = instance.cdir.clone();
    row.resource_status = instance.resource_status.clone();
    row.workload_type = instance.workload_type.clone();
    row.request_id = instance.request_id.clone();
    row.memory = Some(instance.memory);
    row.cpu = Some(instance.cpu);
    row.storage = Some(instance.total_storage());
    row.storage_pool_name = instance.first_pool_name().to_string();

    ItemOutcome {
        subject: t.name.clone(),
        status: ItemStatus::Matched {
            inventory_id: instance.hostname.clone(),
        },
        patch: None,
        notifications: Vec::new(),
        row: Some(ReportRow::Vm(row)),
    }
}

fn miss(subject: String, reason: MissReason, row: ReportRow) -> ItemOutcome {
    ItemOutcome {
        subject,
        status: ItemStatus::Miss(reason),
        patch: None,
        notifications: Vec::new(),
        row: Some(row),
    }
}
