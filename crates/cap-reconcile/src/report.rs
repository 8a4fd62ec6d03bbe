//! Audit-trail rows, one struct per record kind.
//!
//! Inventory-derived values are `Option`: `None` means no counterpart was
//! found. Rendering turns `None`, and the pipeline's own `-1` "unknown" marker,
//! into an empty cell. The timestamp column is appended by the writer.

use cap_schemas::RecordKind;
use serde::Serialize;

/// Integer cell. Unknown renders empty, never as `-1` or `0`.
pub fn render_int(value: Option<i64>) -> String {
    match value {
        None | Some(-1) => String::new(),
        Some(v) => v.to_string(),
    }
}

/// Float cell with six decimals.
pub fn render_float(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v == -1.0 => String::new(),
        Some(v) => format!("{v:.6}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastoreRow {
    pub name: String,
    pub site: String,
    pub total_gb: i64,
    pub requested_gb: i64,
    pub committed_gb: i64,
    pub size: Option<i64>,
    pub size_consumed: Option<i64>,
    pub size_free: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmRow {
    pub hostname: String,
    pub site: String,
    pub vcenter_cpu: i64,
    pub memory_requested_gb: i64,
    pub storage_requested_gb: i64,
    pub profile: String,
    pub cdir: String,
    pub resource_status: String,
    pub workload_type: String,
    pub request_id: String,
    pub storage_pool_name: String,
    pub memory: Option<i64>,
    pub cpu: Option<f64>,
    pub storage: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRow {
    /// `resource_pool` or `cluster`.
    pub flavor: &'static str,
    pub name: String,
    pub pod: String,
    pub site: String,
    pub datacenter: String,
    pub cpu_total: i64,
    pub cpu_requested: i64,
    pub memory_total: i64,
    pub memory_requested: i64,
    pub cluster_id: String,
    pub cpu_in_use: Option<i64>,
    pub vcenter_cpu_consumed: Option<i64>,
    pub memory_in_use: Option<i64>,
    pub vcenter_memory_consumed: Option<i64>,
    /// Paths patched by this decision, `;`-joined.
    pub patched: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterHostRow {
    pub hostname: String,
    pub cluster_name: String,
    pub pod: String,
    pub datacenter: String,
    pub cluster_id: String,
    pub profile: String,
    pub server_id: String,
    pub stored_server_id: String,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportRow {
    Cluster(ClusterRow),
    ClusterHost(ClusterHostRow),
    Datastore(DatastoreRow),
    Vm(VmRow),
}

const CLUSTER_HEADER: &[&str] = &[
    "Type",
    "Name",
    "Pod",
    "Site",
    "Datacenter",
    "VCPUTOTAL",
    "VCPUREQUESTED",
    "MEMORYTOTALGB",
    "MEMORYREQUESTEDGB",
    "ClusterID",
    "CPUInUse",
    "VcenterCPUConsumed",
    "MemoryInUse",
    "VcenterMemoryConsumed",
    "Patched",
];

const CLUSTER_HOST_HEADER: &[&str] = &[
    "Hostname",
    "ClusterName",
    "Pod",
    "Datacenter",
    "ClusterID",
    "Profile",
    "ServerID",
    "StoredServerID",
    "Outcome",
];

const DATASTORE_HEADER: &[&str] = &[
    "Name",
    "Site",
    "Size",
    "TOTALGB",
    "SizeConsumed",
    "REQUESTEDGB",
    "COMMITTEDGB",
    "SizeFree",
];

const VM_HEADER: &[&str] = &[
    "Hostname",
    "Site",
    "Profile",
    "Cdir",
    "ResourceStatus",
    "WorkloadType",
    "RequestID",
    "StoragePoolName",
    "Memory",
    "MEMORYREQUESTEDGB",
    "CPU",
    "VcenterCPU",
    "Storage",
    "STORAGEREQUESTEDGB",
];

impl ReportRow {
    /// Column names for a kind, without the trailing timestamp column.
    pub fn header(kind: RecordKind) -> &'static [&'static str] {
        match kind {
            RecordKind::Cluster => CLUSTER_HEADER,
            RecordKind::ClusterHost => CLUSTER_HOST_HEADER,
            RecordKind::Datastore => DATASTORE_HEADER,
            RecordKind::Vm => VM_HEADER,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            ReportRow::Cluster(_) => RecordKind::Cluster,
            ReportRow::ClusterHost(_) => RecordKind::ClusterHost,
            ReportRow::Datastore(_) => RecordKind::Datastore,
            ReportRow::Vm(_) => RecordKind::Vm,
        }
    }

    /// Rendered cells in header order.
    pub fn cells(&self) -> Vec<String> {
        match self {
            ReportRow::Cluster(r) => vec![
                r.flavor.to_string(),
                r.name.clone(),
                r.pod.clone(),
                r.site.clone(),
                r.datacenter.clone(),
                render_int(Some(r.cpu_total)),
                render_int(Some(r.cpu_requested)),
                render_int(Some(r.memory_total)),
                render_int(Some(r.memory_requested)),
                r.cluster_id.clone(),
                render_int(r.cpu_in_use),
                render_int(r.vcenter_cpu_consumed),
                render_int(r.memory_in_use),
                render_int(r.vcenter_memory_consumed),
                r.patched.clone(),
            ],
            ReportRow::ClusterHost(r) => vec![
                r.hostname.clone(),
                r.cluster_name.clone(),
                r.pod.clone(),
                r.datacenter.clone(),
                r.cluster_id.clone(),
                r.profile.clone(),
                r.server_id.clone(),
                r.stored_server_id.clone(),
                r.outcome.clone(),
            ],
            ReportRow::Datastore(r) => vec![
                r.name.clone(),
                r.site.clone(),
                render_int(r.size),
                render_int(Some(r.total_gb)),
                render_int(r.size_consumed),
                render_int(Some(r.requested_gb)),
                render_int(Some(r.committed_gb)),
                render_int(r.size_free),
            ],
            ReportRow::Vm(r) => vec![
                r.hostname.clone(),
                r.site.clone(),
                r.profile.clone(),
                r.cdir.clone(),
                r.resource_status.clone(),
                r.workload_type.clone(),
                r.request_id.clone(),
                r.storage_pool_name.clone(),
                render_int(r.memory),
                render_int(Some(r.memory_requested_gb)),
                render_float(r.cpu),
                render_int(Some(r.vcenter_cpu)),
                render_int(r.storage),
                render_int(Some(r.storage_requested_gb)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_values_render_empty() {
        assert_eq!(render_int(None), "");
        assert_eq!(render_int(Some(-1)), "");
        assert_eq!(render_int(Some(0)), "0");
        assert_eq!(render_float(None), "");
        assert_eq!(render_float(Some(-1.0)), "");
        assert_eq!(render_float(Some(2.5)), "2.500000");
    }

    #[test]
    fn every_kind_renders_one_cell_per_column() {
        let ds = ReportRow::Datastore(DatastoreRow {
            name: "DS1".to_string(),
            site: "DAL00".to_string(),
            total_gb: 1000,
            requested_gb: 500,
            committed_gb: 400,
            size: None,
            size_consumed: None,
            size_free: None,
        });
        assert_eq!(ds.cells().len(), ReportRow::header(RecordKind::Datastore).len());
        assert_eq!(
            ds.cells(),
            vec!["DS1", "DAL00", "", "1000", "", "500", "400", ""]
        );

        let host = ReportRow::ClusterHost(ClusterHostRow {
            hostname: "esx-09".to_string(),
            cluster_name: "POOL-A".to_string(),
            pod: "7".to_string(),
            datacenter: "DAL09".to_string(),
            cluster_id: String::new(),
            profile: String::new(),
            server_id: String::new(),
            stored_server_id: String::new(),
            outcome: "no_cluster".to_string(),
        });
        assert_eq!(host.cells().len(), ReportRow::header(RecordKind::ClusterHost).len());
    }
}
