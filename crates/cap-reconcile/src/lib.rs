//! cap-reconcile
//!
//! Reconciliation engine: telemetry record + inventory snapshot in, decisions
//! out.
//!
//! Architectural decisions:
//! - Site identifiers are normalized before any comparison or report emission
//! - Matchers scan the snapshot linearly; the first match in snapshot order wins
//! - Matchers hand back an index plus a borrow of the owning snapshot, never a
//!   reference to a loop-local copy
//! - A field is patched only when telemetry disagrees with BOTH the in-use
//!   value and the externally observed mirror
//! - VM and cluster-host records never produce patches
//!
//! Deterministic, pure logic. No IO. Patches, report rows and notifications are
//! returned as values; applying them is the caller's job.

mod engine;
mod matchers;
mod notification;
mod policy;
mod report;
mod site;
mod types;

pub use engine::{reconcile_record, ReconcileContext, ReconcileOptions};
pub use matchers::{
    cluster_key, find_cluster, find_cluster_for_host, find_cluster_host, find_instance,
    find_server_id, match_cluster, match_datastore, ClusterKey, ClusterLookup, StorageLookup,
    RESOURCE_POOL_PROFILE,
};
pub use notification::Notification;
pub use policy::{
    cluster_patch, drifted, storage_patch, CPU_PATH, MEMORY_PATH, STORAGE_PATH,
};
pub use report::{
    render_float, render_int, ClusterHostRow, ClusterRow, DatastoreRow, ReportRow, VmRow,
};
pub use site::normalize_site;
pub use types::*;
