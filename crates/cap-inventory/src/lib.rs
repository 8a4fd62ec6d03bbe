//! cap-inventory
//!
//! RPC boundary to the fleet-inventory service and the fleet registry.
//!
//! The traits are what the ingestion loop depends on; the `Http*` types are
//! the production implementations. Snapshot assembly lives here too because
//! its all-or-nothing rule is a property of the fetch, not of the loop.

mod api;
mod error;
mod fleet;
mod http;

pub use api::{fetch_snapshot, Dimension, FleetRegistrySource, InventoryApi};
pub use error::{InventoryError, SnapshotFetchError};
pub use fleet::{FleetCredentials, HttpFleetRegistry};
pub use http::{HttpInventoryClient, InventoryClientOptions};
