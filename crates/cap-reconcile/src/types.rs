use cap_schemas::{PatchRequest, RecordKind, StreamKind};
use serde::Serialize;

use crate::notification::Notification;
use crate::report::ReportRow;

/// A snapshot element found by a matcher: its position in the owning
/// collection plus a borrow of that collection's element.
#[derive(Debug)]
pub struct Matched<'a, T> {
    pub index: usize,
    pub entry: &'a T,
}

impl<'a, T> Clone for Matched<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Matched<'a, T> {}

impl<'a, T> PartialEq for Matched<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.entry, other.entry)
    }
}

/// Why an element found no usable inventory counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissReason {
    /// No inventory cluster carries the element's key.
    NoCluster,
    /// Telemetry pod is not an integer; the element cannot be keyed.
    PodUnparsable { raw: String },
    /// No inventory storage has the datastore's name.
    NoStorage,
    /// The storage exists but no cluster at the element's site lists it.
    StorageNotAtSite { storage_id: String },
    /// Hostname absent from the fleet registry; server id unknown.
    NotInFleetRegistry,
    /// No inventory instance has the VM's hostname.
    NoInstance,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NoCluster => "no_cluster",
            MissReason::PodUnparsable { .. } => "pod_unparsable",
            MissReason::NoStorage => "no_storage",
            MissReason::StorageNotAtSite { .. } => "storage_not_at_site",
            MissReason::NotInFleetRegistry => "not_in_fleet_registry",
            MissReason::NoInstance => "no_instance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Counterpart found. `ItemOutcome::patch` holds drifting fields, if any.
    Matched { inventory_id: String },
    /// Counterpart found but its profile is not reconciled for this kind.
    Ineligible {
        inventory_id: String,
        profile: String,
    },
    Miss(MissReason),
    /// Element arrived on a cluster stream that does not reconcile its version.
    WrongStream { version: String },
}

/// Decision for one element of a record's `data` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    /// Human-readable name of the element (cluster, pool, host, datastore, VM).
    pub subject: String,
    pub status: ItemStatus,
    pub patch: Option<PatchRequest>,
    pub notifications: Vec<Notification>,
    /// `None` only for wrong-stream elements.
    pub row: Option<ReportRow>,
}

impl ItemOutcome {
    pub fn is_miss(&self) -> bool {
        matches!(self.status, ItemStatus::Miss(_))
    }

    /// Matched with nothing to write.
    pub fn is_up_to_date(&self) -> bool {
        matches!(self.status, ItemStatus::Matched { .. }) && self.patch.is_none()
    }
}

/// Decisions for a whole stream record, in `data` order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub kind: RecordKind,
    pub stream: StreamKind,
    pub items: Vec<ItemOutcome>,
}

impl RecordOutcome {
    pub fn patches(&self) -> impl Iterator<Item = &PatchRequest> {
        self.items.iter().filter_map(|i| i.patch.as_ref())
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().flat_map(|i| i.notifications.iter())
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.items.iter().filter_map(|i| i.row.clone()).collect()
    }

    pub fn misses(&self) -> usize {
        self.items.iter().filter(|i| i.is_miss()).count()
    }

    pub fn pod_parse_failures(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(
                    i.status,
                    ItemStatus::Miss(MissReason::PodUnparsable { .. })
                )
            })
            .count()
    }
}
