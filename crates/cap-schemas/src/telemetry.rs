use serde::{Deserialize, Serialize};

/// Version tag carried by resource-pool flavoured cluster telemetry.
pub const RESOURCE_POOL_VERSION: &str = "CMS 3.x";

// ---------------------------------------------------------------------------
// Stream routing
// ---------------------------------------------------------------------------

/// Every stream discriminator the worker understands.
///
/// Two streams (`esx_cluster`, `resource_pool`) share the cluster record
/// shape; they differ only in which elements of the `data` array are
/// reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Datastore,
    VmInfo,
    EsxCluster,
    ResourcePool,
    EsxHost,
}

const STREAM_TABLE: &[(&str, StreamKind)] = &[
    ("xseries.datastore", StreamKind::Datastore),
    ("xseries.vminfo", StreamKind::VmInfo),
    ("xseries.esx_cluster", StreamKind::EsxCluster),
    ("xseries.resource_pool", StreamKind::ResourcePool),
    ("xseries.esx_host", StreamKind::EsxHost),
];

impl StreamKind {
    pub fn from_stream_name(name: &str) -> Option<Self> {
        STREAM_TABLE
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(self) -> &'static str {
        STREAM_TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(wire, _)| *wire)
            .unwrap_or("unknown")
    }

    pub fn record_kind(self) -> RecordKind {
        match self {
            StreamKind::Datastore => RecordKind::Datastore,
            StreamKind::VmInfo => RecordKind::Vm,
            StreamKind::EsxCluster | StreamKind::ResourcePool => RecordKind::Cluster,
            StreamKind::EsxHost => RecordKind::ClusterHost,
        }
    }
}

/// The four record shapes. Report files and counters are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Cluster,
    ClusterHost,
    Datastore,
    Vm,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Cluster => "cluster",
            RecordKind::ClusterHost => "cluster_host",
            RecordKind::Datastore => "datastore",
            RecordKind::Vm => "vm",
        }
    }

    /// Kinds whose drift is written back to inventory.
    pub fn is_patchable(self) -> bool {
        matches!(self, RecordKind::Cluster | RecordKind::Datastore)
    }
}

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTelemetry {
    #[serde(rename = "SITE_ID")]
    pub site: String,
    #[serde(rename = "PODID")]
    pub pod: String,
    #[serde(rename = "DATACENTER")]
    pub datacenter: String,
    /// Cluster name; populated on the cluster stream.
    #[serde(rename = "ESXNAME", default)]
    pub esx_name: String,
    /// Resource pool name; populated on the resource-pool stream.
    #[serde(rename = "POOL_NAME", default)]
    pub pool_name: String,
    #[serde(rename = "VCPU_TOTAL")]
    pub cpu_total: i64,
    #[serde(rename = "VCPU_REQUESTED")]
    pub cpu_requested: i64,
    #[serde(rename = "MEMORY_TOTAL_GB")]
    pub memory_total: i64,
    #[serde(rename = "MEMORY_REQUESTED_GB")]
    pub memory_requested: i64,
    #[serde(rename = "VCPU_TOTAL_REQUESTED_PCT", default)]
    pub cpu_requested_pct: f64,
    #[serde(rename = "VCPU_TOTAL_AVAILABLE_PCT", default)]
    pub cpu_available_pct: f64,
    #[serde(rename = "MEMORY_TOTAL_REQUESTED_PCT", default)]
    pub memory_requested_pct: f64,
    #[serde(rename = "MEMORY_TOTAL_AVAILABLE_PCT", default)]
    pub memory_available_pct: f64,
    #[serde(rename = "VERSION", default)]
    pub version: String,
}

impl ClusterTelemetry {
    pub fn is_resource_pool(&self) -> bool {
        self.version == RESOURCE_POOL_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHostTelemetry {
    #[serde(rename = "HOSTNAME")]
    pub hostname: String,
    #[serde(rename = "PODID")]
    pub pod: String,
    #[serde(rename = "ESXNAME")]
    pub cluster_name: String,
    #[serde(rename = "DATACENTER")]
    pub datacenter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreTelemetry {
    #[serde(rename = "DATASTORE_NAME")]
    pub name: String,
    #[serde(rename = "PODID")]
    pub pod: String,
    #[serde(rename = "DATACENTER")]
    pub datacenter: String,
    #[serde(rename = "TOTAL_GB")]
    pub total_gb: i64,
    #[serde(rename = "REQUESTED_GB")]
    pub requested_gb: i64,
    #[serde(rename = "COMMITTED_GB")]
    pub committed_gb: i64,
    #[serde(rename = "SITE_ID")]
    pub site: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmTelemetry {
    #[serde(rename = "VM_NAME")]
    pub name: String,
    #[serde(rename = "CPU")]
    pub cpu: i64,
    #[serde(rename = "MEMORY_REQUESTED_GB")]
    pub memory_requested_gb: i64,
    #[serde(rename = "STORAGE_REQUESTED_GB")]
    pub storage_requested_gb: i64,
    #[serde(rename = "PODID")]
    pub pod: String,
    #[serde(rename = "SITE_ID")]
    pub site: String,
    #[serde(rename = "DATACENTER")]
    pub datacenter: String,
}

// ---------------------------------------------------------------------------
// Tagged record
// ---------------------------------------------------------------------------

/// One decoded stream record. Each variant holds the `data` array of its
/// stream; elements are reconciled independently but share one offset.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    Cluster {
        stream: StreamKind,
        data: Vec<ClusterTelemetry>,
    },
    ClusterHost {
        data: Vec<ClusterHostTelemetry>,
    },
    Datastore {
        data: Vec<DatastoreTelemetry>,
    },
    Vm {
        data: Vec<VmTelemetry>,
    },
}

impl TelemetryRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            TelemetryRecord::Cluster { .. } => RecordKind::Cluster,
            TelemetryRecord::ClusterHost { .. } => RecordKind::ClusterHost,
            TelemetryRecord::Datastore { .. } => RecordKind::Datastore,
            TelemetryRecord::Vm { .. } => RecordKind::Vm,
        }
    }

    pub fn stream(&self) -> StreamKind {
        match self {
            TelemetryRecord::Cluster { stream, .. } => *stream,
            TelemetryRecord::ClusterHost { .. } => StreamKind::EsxHost,
            TelemetryRecord::Datastore { .. } => StreamKind::Datastore,
            TelemetryRecord::Vm { .. } => StreamKind::VmInfo,
        }
    }

    /// Number of elements in the record's `data` array.
    pub fn len(&self) -> usize {
        match self {
            TelemetryRecord::Cluster { data, .. } => data.len(),
            TelemetryRecord::ClusterHost { data } => data.len(),
            TelemetryRecord::Datastore { data } => data.len(),
            TelemetryRecord::Vm { data } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_table_round_trips_every_kind() {
        for kind in [
            StreamKind::Datastore,
            StreamKind::VmInfo,
            StreamKind::EsxCluster,
            StreamKind::ResourcePool,
            StreamKind::EsxHost,
        ] {
            assert_eq!(StreamKind::from_stream_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn both_cluster_streams_share_the_cluster_shape() {
        assert_eq!(StreamKind::EsxCluster.record_kind(), RecordKind::Cluster);
        assert_eq!(StreamKind::ResourcePool.record_kind(), RecordKind::Cluster);
    }

    #[test]
    fn unknown_stream_name_is_not_routed() {
        assert_eq!(StreamKind::from_stream_name("xseries.nsx_edge"), None);
        assert_eq!(StreamKind::from_stream_name("XSERIES.DATASTORE"), None);
    }
}
