use cap_reconcile::Notification;
use serde_json::{json, Value};

use crate::icons::ProfileIcons;

fn section(text: String) -> Value {
    json!({"type": "section", "text": {"type": "mrkdwn", "text": text}})
}

fn fields(items: Vec<String>) -> Value {
    let fields: Vec<Value> = items
        .into_iter()
        .map(|t| json!({"type": "mrkdwn", "text": t}))
        .collect();
    json!({"type": "section", "fields": fields})
}

fn divider() -> Value {
    json!({"type": "divider"})
}

/// Chat blocks for one notification, headed by the profile icon.
pub fn render_blocks(n: &Notification, icons: &ProfileIcons) -> Vec<Value> {
    let profile = n.profile();
    let icon = icons.icon_for(profile);

    match n {
        Notification::NewClusterHost {
            hostname,
            server_id,
            cluster_id,
            workload_types,
            ..
        } => vec![
            section(format!("[{icon} *{profile}*] *{}*", n.title())),
            section(format!("*Clusterhost Name: {hostname}*")),
            section(format!("*ServerID:  {server_id} ClusterID: {cluster_id}*")),
            section(format!("*WorkLoad Types: {}*", workload_types.join(", "))),
            divider(),
        ],
        Notification::ServerIdChanged {
            hostname,
            server_id,
            previous_server_id,
            ..
        } => vec![
            section(format!("[{icon} *{profile}*] *{}*", n.title())),
            section(format!("*Clusterhost Name: {hostname}*")),
            section(format!(
                "*New ServerID:  {server_id}    Old ServerID: {previous_server_id}*"
            )),
            divider(),
        ],
        Notification::ClusterCapacity {
            cluster_name,
            pool_name,
            pod,
            datacenter,
            site,
            cpu_requested_pct,
            cpu_available_pct,
            memory_requested_pct,
            memory_available_pct,
            ..
        } => vec![
            section(format!(
                "[{icon} *{profile}*] *Cluster Name: {cluster_name}* *Resource Pool Name: {pool_name}*"
            )),
            section(format!(
                "*Site:  {site} Datacenter: {datacenter} Pod: {pod}*"
            )),
            fields(vec![
                format!("*CPU Percent Requested: {cpu_requested_pct:.2}%*"),
                format!("*CPU Percent Available: {cpu_available_pct:.2}%*"),
                format!("*Memory Percent Requested: {memory_requested_pct:.2}%*"),
                format!("*Memory Percent Available: {memory_available_pct:.2}%*"),
            ]),
            divider(),
        ],
    }
}
