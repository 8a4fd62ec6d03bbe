use serde::Serialize;

/// Operator-facing event produced by the engine. Delivery is the notifier's
/// concern; the engine only decides that one is due.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Host is in the fleet registry but has no inventory record yet.
    NewClusterHost {
        hostname: String,
        server_id: String,
        cluster_id: String,
        workload_types: Vec<String>,
        profile: String,
    },
    /// Inventory's stored server id disagrees with the fleet registry.
    ServerIdChanged {
        hostname: String,
        server_id: String,
        previous_server_id: String,
        profile: String,
    },
    /// Capacity percentages for a matched cluster. Only produced when
    /// capacity alerts are enabled.
    ClusterCapacity {
        cluster_name: String,
        pool_name: String,
        pod: String,
        datacenter: String,
        site: String,
        cpu_requested_pct: f64,
        cpu_available_pct: f64,
        memory_requested_pct: f64,
        memory_available_pct: f64,
        profile: String,
    },
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::NewClusterHost { .. } => "Attention! New Clusterhost Created",
            Notification::ServerIdChanged { .. } => "Attention! Clusterhost Has a new ServerID",
            Notification::ClusterCapacity { .. } => "Cluster Capacity",
        }
    }

    pub fn profile(&self) -> &str {
        match self {
            Notification::NewClusterHost { profile, .. }
            | Notification::ServerIdChanged { profile, .. }
            | Notification::ClusterCapacity { profile, .. } => profile,
        }
    }

    /// Host or cluster the notification is about.
    pub fn subject(&self) -> &str {
        match self {
            Notification::NewClusterHost { hostname, .. }
            | Notification::ServerIdChanged { hostname, .. } => hostname,
            Notification::ClusterCapacity {
                cluster_name,
                pool_name,
                ..
            } => {
                if pool_name.is_empty() {
                    cluster_name
                } else {
                    pool_name
                }
            }
        }
    }
}
