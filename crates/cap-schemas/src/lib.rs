//! Wire-level types shared by every capacity-worker crate.
//!
//! Two families of shapes live here:
//! - telemetry records as they arrive on the monitoring stream
//!   (upper-snake-case field names, one `data` array per stream record)
//! - inventory records as the fleet-inventory service returns them
//!   (camelCase field names)
//!
//! [`decode`] is the single entry point that turns an opaque stream payload
//! into a typed [`TelemetryRecord`]. No IO happens in this crate.

mod decode;
mod inventory;
mod patch;
mod telemetry;

pub use decode::{decode, decode_as, DecodeError};
pub use inventory::{
    Cluster, ClusterHost, FleetHost, FleetRegistry, Instance, InstanceStorage, InventorySnapshot,
    Storage,
};
pub use patch::{Collection, PatchOperation, PatchRequest};
pub use telemetry::{
    ClusterHostTelemetry, ClusterTelemetry, DatastoreTelemetry, RecordKind, StreamKind,
    TelemetryRecord, VmTelemetry, RESOURCE_POOL_VERSION,
};
