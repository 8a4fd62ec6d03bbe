use std::sync::Arc;

use cap_reconcile::Notification;
use cap_runtime::LoopSettings;
use cap_schemas::{Cluster, InventorySnapshot};
use cap_testkit::{
    payload, Harness, MemorySource, RecordingNotifier, StaticFleet, UnreachableFleet, WhenDrained,
};
use serde_json::json;

fn snapshot() -> InventorySnapshot {
    let clusters: Vec<Cluster> = serde_json::from_value(json!([{
        "id": "c-7", "clusterName": "esx-cl-01", "dataCenterName": "DAL09", "pod": 7,
        "profile": "3x", "workloadTypes": ["db"]
    }]))
    .unwrap();
    InventorySnapshot {
        clusters,
        ..InventorySnapshot::default()
    }
}

fn host_record() -> Vec<u8> {
    payload(
        "xseries.esx_host",
        json!([{"HOSTNAME": "esx-03.dal09", "PODID": "7", "ESXNAME": "esx-cl-01", "DATACENTER": "DAL09"}]),
    )
}

#[tokio::test]
async fn unreachable_registry_turns_hosts_into_misses() {
    let source = MemorySource::from_payloads(0, vec![host_record()], WhenDrained::Close);
    let h = Harness::new(source, snapshot(), 0);
    let mut lp = h.ingestion_loop(LoopSettings::default(), Some(Arc::new(UnreachableFleet)));

    let stats = lp.run_once().await.unwrap();

    assert_eq!(stats.misses, 1);
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.checkpoint.writes(), vec![0]);
}

#[tokio::test]
async fn reachable_registry_announces_a_new_host() {
    let source = MemorySource::from_payloads(0, vec![host_record()], WhenDrained::Close);
    let h = Harness::new(source, snapshot(), 0);
    let fleet = StaticFleet::from_pairs(&[("esx-03.dal09", 3003)]);
    let mut lp = h.ingestion_loop(LoopSettings::default(), Some(Arc::new(fleet)));

    let stats = lp.run_once().await.unwrap();

    assert_eq!(stats.notifications_sent, 1);
    match &h.notifier.sent()[..] {
        [Notification::NewClusterHost {
            hostname,
            server_id,
            cluster_id,
            ..
        }] => {
            assert_eq!(hostname, "esx-03.dal09");
            assert_eq!(server_id, "3003");
            assert_eq!(cluster_id, "c-7");
        }
        other => panic!("unexpected notifications: {other:?}"),
    }
}

#[tokio::test]
async fn notification_failure_is_counted_not_fatal() {
    let source = MemorySource::from_payloads(0, vec![host_record()], WhenDrained::Close);
    let h = Harness::new(source, snapshot(), 0).with_notifier(RecordingNotifier::rejecting());
    let fleet = StaticFleet::from_pairs(&[("esx-03.dal09", 3003)]);
    let mut lp = h.ingestion_loop(LoopSettings::default(), Some(Arc::new(fleet)));

    let stats = lp.run_once().await.unwrap();

    assert_eq!(stats.notification_failures, 1);
    assert_eq!(stats.notifications_sent, 0);
    assert_eq!(h.checkpoint.writes(), vec![0]);
}
