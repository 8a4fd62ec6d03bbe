//! After a batch whose last record sits at position P, the persisted offset
//! is P, and the next batch resumes at P + 1.

use cap_runtime::{LoopSettings, LoopState};
use cap_schemas::{Cluster, InventorySnapshot, Storage};
use cap_testkit::{payload, Harness, MemorySource, WhenDrained};
use serde_json::json;

fn snapshot() -> InventorySnapshot {
    let clusters: Vec<Cluster> = serde_json::from_value(json!([
        {"id": "c-1", "poolLocation": "DAL10", "storageIds": ["s-1"]}
    ]))
    .unwrap();
    let storages: Vec<Storage> = serde_json::from_value(json!([
        {"id": "s-1", "name": "DS1", "size": 2000, "inUseByOpaas": 500, "vCenterSizeConsumed": 500}
    ]))
    .unwrap();
    InventorySnapshot {
        clusters,
        storages,
        ..InventorySnapshot::default()
    }
}

fn datastore(requested_gb: i64) -> Vec<u8> {
    payload(
        "xseries.datastore",
        json!([{
            "DATASTORE_NAME": "DS1", "PODID": "7", "DATACENTER": "DAL09", "SITE_ID": "DAL10",
            "TOTAL_GB": 1000, "REQUESTED_GB": requested_gb, "COMMITTED_GB": 400
        }]),
    )
}

#[tokio::test]
async fn fresh_start_persists_each_record_position_in_order() {
    let source = MemorySource::from_payloads(
        0,
        vec![datastore(500), datastore(500), datastore(500)],
        WhenDrained::Close,
    );
    let h = Harness::new(source, snapshot(), 0);
    let mut lp = h.ingestion_loop(LoopSettings::default(), None);

    let stats = lp.run_once().await.unwrap();

    assert_eq!(stats.records, 3);
    assert_eq!(stats.first_offset, Some(0));
    assert_eq!(stats.last_offset, Some(2));
    assert_eq!(h.checkpoint.writes(), vec![0, 1, 2]);
    assert_eq!(h.checkpoint.offset(), 2);
    assert_eq!(h.source.seeks(), vec![0]);
    assert_eq!(lp.state(), LoopState::Idle);

    // All three were already up to date: one row each, no writes upstream.
    assert_eq!(stats.rows_written, 3);
    assert!(h.inventory.patch_attempts().is_empty());
}

#[tokio::test]
async fn second_batch_after_a_fresh_start_resumes_past_record_zero() {
    let source = MemorySource::from_payloads(
        0,
        vec![datastore(500), datastore(500), datastore(500)],
        WhenDrained::Close,
    );
    let h = Harness::new(source, snapshot(), 0);
    let settings = LoopSettings {
        batch_size: 1,
        ..LoopSettings::default()
    };
    let mut lp = h.ingestion_loop(settings, None);

    let first = lp.run_once().await.unwrap();
    let second = lp.run_once().await.unwrap();

    assert_eq!(first.first_offset, Some(0));
    assert_eq!(second.first_offset, Some(1));
    assert_eq!(h.source.seeks(), vec![0, 1]);
    assert_eq!(h.checkpoint.writes(), vec![0, 1]);
}

#[tokio::test]
async fn restart_resumes_one_past_the_persisted_offset() {
    let source = MemorySource::from_payloads(
        40,
        (0..5).map(|_| datastore(500)).collect(),
        WhenDrained::Close,
    );
    let h = Harness::new(source, snapshot(), 41);
    let mut lp = h.ingestion_loop(LoopSettings::default(), None);

    let stats = lp.run_once().await.unwrap();

    assert_eq!(h.source.seeks(), vec![42]);
    assert_eq!(stats.records, 3);
    assert_eq!(h.checkpoint.writes(), vec![42, 43, 44]);
}

#[tokio::test]
async fn batch_size_bounds_each_read() {
    let source = MemorySource::from_payloads(
        10,
        (0..5).map(|_| datastore(500)).collect(),
        WhenDrained::Close,
    );
    let h = Harness::new(source, snapshot(), 9);
    let settings = LoopSettings {
        batch_size: 2,
        ..LoopSettings::default()
    };
    let mut lp = h.ingestion_loop(settings, None);

    let first = lp.run_once().await.unwrap();
    let second = lp.run_once().await.unwrap();

    assert_eq!(first.records, 2);
    assert_eq!(second.records, 2);
    assert_eq!(h.source.seeks(), vec![10, 12]);
    assert_eq!(h.checkpoint.offset(), 13);
    // One snapshot per batch: four dimension reads each.
    assert_eq!(h.inventory.dimension_calls().len(), 8);
}
