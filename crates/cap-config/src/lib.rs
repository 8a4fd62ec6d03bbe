//! cap-config
//!
//! Layered YAML configuration for the capacity worker.
//!
//! - Files merge in order; later files override earlier ones key by key.
//! - The merged document is hashed (SHA-256 of canonical JSON) so a running
//!   worker can report exactly which configuration it was started with.
//! - Literal secrets are refused. Files carry env-var NAMES only; values are
//!   resolved once at startup by [`resolve_secrets`].
//! - Leaves the worker never reads are reported by [`report_unused_keys`].

mod secrets;
mod settings;

pub use secrets::{resolve_secrets, resolve_secrets_with, ResolvedSecrets};
pub use settings::{
    FleetRegistryConfig, InventoryConfig, KafkaConfig, LogConfig, LogFormat, NotifyConfig,
    OutputConfig, SlackConfig, SourceKind, StreamConfig, WorkerConfig,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Leaf string values starting with one of these abort loading with
/// CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "xoxb-",      // Slack bot token
    "xoxp-",      // Slack user token
    "xapp-",      // Slack app token
    "Bearer ",    // pasted auth header
    "-----BEGIN", // PEM private keys
    "AKIA",       // AWS access key ID
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "sk-",        // generic API secret keys
];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view. Missing keys take their defaults.
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let cfg: WorkerConfig = serde_json::from_value(self.config_json.clone())
            .context("config does not match the worker schema")?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_layered_yaml<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let p = p.as_ref();
        let raw = fs::read_to_string(p)
            .with_context(|| format!("failed to read yaml path: {}", p.display()))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("layer {layer}: invalid yaml"))?;
        // An empty document parses as null; treat it as an empty layer.
        if doc.is_null() {
            continue;
        }
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("layer {layer}: yaml->json conversion failed"))?;
        overlay(&mut merged, doc);
    }

    let mut secret_leaf = None;
    visit_leaves(&merged, &mut Vec::new(), &mut |path, leaf| {
        let hit = leaf.as_str().is_some_and(looks_like_secret);
        if hit && secret_leaf.is_none() {
            secret_leaf = Some(to_pointer(path));
        }
    });
    if let Some(leaf) = secret_leaf {
        bail!("CONFIG_SECRET_DETECTED leaf={leaf} value=REDACTED");
    }

    // serde_json maps are ordered, so this string is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Apply `layer` on top of `base`. Maps merge key by key; anything else
/// (scalars, lists) replaces what was there.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, layer) => *slot = layer,
    }
}

/// Calls `f` with the key path of every scalar leaf. List items are addressed
/// by index.
fn visit_leaves<'v>(v: &'v Value, path: &mut Vec<String>, f: &mut dyn FnMut(&[String], &'v Value)) {
    match v {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                visit_leaves(child, path, f);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(i.to_string());
                visit_leaves(child, path, f);
                path.pop();
            }
        }
        leaf => f(path, leaf),
    }
}

/// JSON-pointer rendering of a key path (`~` and `/` escaped).
fn to_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter()
        .map(|seg| format!("/{}", seg.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim_start();
    if t.trim_end().len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// JSON-pointer prefixes the worker actually reads. A leaf under any of these
/// is consumed; anything else is reported, which catches typos such as
/// `stream/batchsize`.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/stream/source",
    "/stream/jsonl_path",
    "/stream/batch_size",
    "/stream/read_timeout_ms",
    "/stream/kafka/brokers",
    "/stream/kafka/topic",
    "/stream/kafka/partition",
    "/stream/kafka/group_id",
    "/stream/kafka/username_env",
    "/stream/kafka/password_env",
    "/inventory/base_url",
    "/inventory/api_key_env",
    "/inventory/accept_invalid_certs",
    "/inventory/timeout_ms",
    "/fleet_registry/urls",
    "/fleet_registry/username_env",
    "/fleet_registry/api_key_env",
    "/fleet_registry/accept_invalid_certs",
    "/fleet_registry/timeout_ms",
    "/notify/slack/token_env",
    "/notify/slack/channel_env",
    "/notify/slack/timeout_ms",
    "/notify/capacity_alerts",
    "/notify/profile_icons",
    "/output/dir",
    "/output/offset_file",
    "/log/format",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Under `Fail`, returns an error when unused keys exist. Under `Warn`, always
/// returns the report.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: Vec<Vec<&str>> = CONSUMED_POINTERS
        .iter()
        .map(|p| p.split('/').filter(|seg| !seg.is_empty()).collect())
        .collect();

    let mut unused = BTreeSet::new();
    visit_leaves(config_json, &mut Vec::new(), &mut |path, _| {
        if !consumed.iter().any(|prefix| is_consumed_by(prefix, path)) {
            unused.insert(to_pointer(path));
        }
    });

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused.into_iter().collect(),
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown = report.unused_leaf_pointers.iter().take(12);
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {}",
            report.unused_leaf_pointers.len(),
            shown.map(String::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    Ok(report)
}

/// Whole-segment prefix match: `stream/batch_size` consumes
/// `stream/batch_size` and anything below it, never `stream/batch_sizes`.
fn is_consumed_by(prefix: &[&str], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(p, seg)| *p == seg.as_str())
}
