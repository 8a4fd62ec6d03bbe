use cap_reconcile::*;
use cap_schemas::*;
use serde_json::json;

fn duplicate_snapshot() -> InventorySnapshot {
    let clusters: Vec<Cluster> = serde_json::from_value(json!([
        {"id": "c-other", "poolLocation": "DAL10", "dataCenterName": "DAL10", "clusterName": "CL-9"},
        {"id": "c-first", "poolLocation": "DAL10", "dataCenterName": "DAL10", "clusterName": "CL-1",
         "cpuInUseByOpaas": 1, "vCenterCPUConsumed": 1},
        {"id": "c-second", "poolLocation": "DAL10", "dataCenterName": "DAL10", "clusterName": "CL-1",
         "cpuInUseByOpaas": 50, "vCenterCPUConsumed": 50}
    ]))
    .unwrap();
    let storages: Vec<Storage> = serde_json::from_value(json!([
        {"id": "s-a", "name": "DS1"},
        {"id": "s-b", "name": "DS1"}
    ]))
    .unwrap();
    let instances: Vec<Instance> = serde_json::from_value(json!([
        {"hostname": "vm-1", "profile": "first"},
        {"hostname": "vm-1", "profile": "second"}
    ]))
    .unwrap();
    InventorySnapshot {
        clusters,
        storages,
        instances,
        ..InventorySnapshot::default()
    }
}

fn cluster_telemetry() -> ClusterTelemetry {
    serde_json::from_value(json!({
        "SITE_ID": "DAL10", "PODID": "1", "DATACENTER": "DAL10", "ESXNAME": "CL-1",
        "VCPU_TOTAL": 100, "VCPU_REQUESTED": 50, "MEMORY_TOTAL_GB": 1, "MEMORY_REQUESTED_GB": 0,
        "VERSION": "CMS 2.x"
    }))
    .unwrap()
}

#[test]
fn scenario_matchers_return_first_qualifying_element() {
    let snap = duplicate_snapshot();

    match match_cluster(&cluster_telemetry(), &snap) {
        ClusterLookup::Found(m) => {
            assert_eq!(m.index, 1);
            assert_eq!(m.entry.id, "c-first");
            assert!(std::ptr::eq(m.entry, &snap.clusters[1]));
        }
        other => panic!("expected a match, got {other:?}"),
    }

    let vm: VmTelemetry = serde_json::from_value(json!({
        "VM_NAME": "vm-1", "CPU": 1, "MEMORY_REQUESTED_GB": 1, "STORAGE_REQUESTED_GB": 1,
        "PODID": "1", "SITE_ID": "DAL10", "DATACENTER": "DAL10"
    }))
    .unwrap();
    let m = find_instance(&vm, &snap.instances).unwrap();
    assert_eq!(m.index, 0);
    assert_eq!(m.entry.profile, "first");
}

#[test]
fn scenario_patch_targets_first_match_even_when_second_is_in_sync() {
    let snap = duplicate_snapshot();
    let fleet = FleetRegistry::default();
    let opts = ReconcileOptions::default();
    let ctx = ReconcileContext {
        snapshot: &snap,
        fleet: &fleet,
        options: &opts,
    };
    let record = TelemetryRecord::Cluster {
        stream: StreamKind::EsxCluster,
        data: vec![cluster_telemetry()],
    };

    let out = reconcile_record(&record, &ctx);
    assert_eq!(out.patches().next().unwrap().target_id, "c-first");
}

#[test]
fn scenario_reconcile_is_idempotent_for_identical_inputs() {
    let snap = duplicate_snapshot();
    let fleet = FleetRegistry::default();
    let opts = ReconcileOptions::default();
    let ctx = ReconcileContext {
        snapshot: &snap,
        fleet: &fleet,
        options: &opts,
    };
    let record = TelemetryRecord::Cluster {
        stream: StreamKind::EsxCluster,
        data: vec![cluster_telemetry(), cluster_telemetry()],
    };

    let a = reconcile_record(&record, &ctx);
    let b = reconcile_record(&record, &ctx);
    assert_eq!(a, b);
    assert_eq!(a.items[0], a.items[1]);
}
