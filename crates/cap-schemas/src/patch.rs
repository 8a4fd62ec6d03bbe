use serde::{Deserialize, Serialize};

/// Inventory collections that accept patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Clusters,
    Storage,
}

impl Collection {
    /// Path segment used by the inventory service.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Clusters => "clusters",
            Collection::Storage => "storage",
        }
    }
}

/// One field-level write, serialized exactly as the inventory service expects
/// it in the PATCH body array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: i64,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: i64) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value,
        }
    }
}

/// Field-level patches against one inventory record, submitted as a single
/// multi-op write. Never a whole-record replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub collection: Collection,
    pub target_id: String,
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    pub fn paths(&self) -> Vec<&str> {
        self.operations.iter().map(|o| o.path.as_str()).collect()
    }
}
