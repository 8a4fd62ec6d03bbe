use cap_schemas::{
    Cluster, ClusterTelemetry, Collection, DatastoreTelemetry, PatchOperation, PatchRequest, Storage,
};

pub const CPU_PATH: &str = "/vCenterCpuConsumed";
pub const MEMORY_PATH: &str = "/vCenterMemoryConsumed";
pub const STORAGE_PATH: &str = "/vCenterSizeConsumed";

/// Two-source-disagreement rule: the requested value must differ from both
/// the inventory's in-use value and its mirror of the external observation.
/// If either already agrees, the field is left alone.
pub fn drifted(requested: i64, in_use: i64, mirrored: i64) -> bool {
    requested != in_use && requested != mirrored
}

fn request(
    collection: Collection,
    target_id: &str,
    operations: Vec<PatchOperation>,
) -> Option<PatchRequest> {
    if operations.is_empty() {
        return None;
    }
    Some(PatchRequest {
        collection,
        target_id: target_id.to_string(),
        operations,
    })
}

/// CPU and memory, evaluated independently. `None` means up to date.
pub fn cluster_patch(t: &ClusterTelemetry, c: &Cluster) -> Option<PatchRequest> {
    let mut ops = Vec::new();
    if drifted(t.cpu_requested, c.cpu_in_use, c.vcenter_cpu_consumed) {
        ops.push(PatchOperation::replace(CPU_PATH, t.cpu_requested));
    }
    if drifted(t.memory_requested, c.memory_in_use, c.vcenter_memory_consumed) {
        ops.push(PatchOperation::replace(MEMORY_PATH, t.memory_requested));
    }
    request(Collection::Clusters, &c.id, ops)
}

pub fn storage_patch(t: &DatastoreTelemetry, s: &Storage) -> Option<PatchRequest> {
    let mut ops = Vec::new();
    if drifted(t.requested_gb, s.in_use, s.vcenter_size_consumed) {
        ops.push(PatchOperation::replace(STORAGE_PATH, t.requested_gb));
    }
    request(Collection::Storage, &s.id, ops)
}
