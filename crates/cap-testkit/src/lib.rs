//! In-memory collaborators for driving the ingestion loop in tests.
//!
//! Every fake shares its state through `Arc<Mutex<..>>`: hand one clone to
//! the loop and keep another to assert on afterwards.

mod inventory;
mod sinks;
mod source;

pub use inventory::{FakeInventory, StaticFleet, UnreachableFleet};
pub use sinks::{MemoryCheckpoint, MemoryReportSink, RecordingNotifier};
pub use source::{MemorySource, WhenDrained};

use std::sync::Arc;

use cap_inventory::FleetRegistrySource;
use cap_runtime::{Collaborators, IngestionLoop, LoopSettings};
use cap_schemas::InventorySnapshot;
use serde_json::{json, Value};

/// One stream record as it arrives on the wire.
pub fn payload(stream_name: &str, data: Value) -> Vec<u8> {
    json!({"streamName": stream_name, "data": data})
        .to_string()
        .into_bytes()
}

/// A complete `xseries.vminfo` element.
pub fn vm_element(name: &str, site: &str) -> Value {
    json!({
        "VM_NAME": name, "CPU": 4, "MEMORY_REQUESTED_GB": 16, "STORAGE_REQUESTED_GB": 100,
        "PODID": "7", "SITE_ID": site, "DATACENTER": "DAL09"
    })
}

/// Test-side handles to every fake wired into a loop.
#[derive(Clone)]
pub struct Harness {
    pub source: MemorySource,
    pub inventory: FakeInventory,
    pub notifier: RecordingNotifier,
    pub reports: MemoryReportSink,
    pub checkpoint: MemoryCheckpoint,
}

impl Harness {
    pub fn new(source: MemorySource, snapshot: InventorySnapshot, persisted_offset: i64) -> Self {
        Self {
            source,
            inventory: FakeInventory::new(snapshot),
            notifier: RecordingNotifier::new(),
            reports: MemoryReportSink::new(),
            checkpoint: MemoryCheckpoint::new(persisted_offset),
        }
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn ingestion_loop(
        &self,
        settings: LoopSettings,
        fleet: Option<Arc<dyn FleetRegistrySource>>,
    ) -> IngestionLoop {
        IngestionLoop::new(
            settings,
            Collaborators {
                source: Box::new(self.source.clone()),
                inventory: Arc::new(self.inventory.clone()),
                fleet,
                notifier: Arc::new(self.notifier.clone()),
                reports: Box::new(self.reports.clone()),
                checkpoint: Box::new(self.checkpoint.clone()),
            },
        )
    }
}
