//! Typed worker settings.
//!
//! Every field has a default so an empty config file starts a worker that
//! reads `stream.jsonl` and writes under `output/`. Secrets never appear
//! here, only the names of the env vars that hold them.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub stream: StreamConfig,
    pub inventory: InventoryConfig,
    pub fleet_registry: FleetRegistryConfig,
    pub notify: NotifyConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream.batch_size == 0 {
            bail!("CONFIG_INVALID stream.batch_size must be > 0");
        }
        if self.stream.read_timeout_ms == 0 {
            bail!("CONFIG_INVALID stream.read_timeout_ms must be > 0");
        }
        if self.inventory.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID inventory.base_url is required");
        }
        match self.stream.source {
            SourceKind::Jsonl => {
                if self.stream.jsonl_path.as_os_str().is_empty() {
                    bail!("CONFIG_INVALID stream.jsonl_path is required for source=jsonl");
                }
            }
            SourceKind::Kafka => {
                if self.stream.kafka.brokers.is_empty() {
                    bail!("CONFIG_INVALID stream.kafka.brokers is required for source=kafka");
                }
                if self.stream.kafka.topic.trim().is_empty() {
                    bail!("CONFIG_INVALID stream.kafka.topic is required for source=kafka");
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Jsonl,
    Kafka,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub source: SourceKind,
    pub jsonl_path: PathBuf,
    pub kafka: KafkaConfig,
    pub batch_size: usize,
    pub read_timeout_ms: u64,
}

impl StreamConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Jsonl,
            jsonl_path: PathBuf::from("stream.jsonl"),
            kafka: KafkaConfig::default(),
            batch_size: 300,
            read_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub partition: i32,
    pub group_id: String,
    pub username_env: String,
    pub password_env: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: Vec::new(),
            topic: String::new(),
            partition: 0,
            group_id: "capacity-worker".to_string(),
            username_env: "CAP_KAFKA_USER".to_string(),
            password_env: "CAP_KAFKA_PASSWORD".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// inventory + fleet registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub accept_invalid_certs: bool,
    pub timeout_ms: u64,
}

impl InventoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key_env: "OPAAS_APIKEY".to_string(),
            accept_invalid_certs: false,
            timeout_ms: 30_000,
        }
    }
}

/// Empty `urls` disables the registry; cluster-host records then all report
/// `not_in_fleet_registry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetRegistryConfig {
    pub urls: Vec<String>,
    pub username_env: String,
    pub api_key_env: String,
    pub accept_invalid_certs: bool,
    pub timeout_ms: u64,
}

impl FleetRegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FleetRegistryConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            username_env: "FLEET_REGISTRY_USER".to_string(),
            api_key_env: "FLEET_REGISTRY_APIKEY".to_string(),
            accept_invalid_certs: false,
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// notify
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub slack: SlackConfig,
    pub capacity_alerts: bool,
    /// Profile -> emoji, layered over the notifier's built-in icons.
    pub profile_icons: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub token_env: String,
    pub channel_env: String,
    pub timeout_ms: u64,
}

impl SlackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token_env: "CAPACITY_SLACK_TOKEN".to_string(),
            channel_env: "CAPACITY_SLACK_CHANNEL".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// output + log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub offset_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            offset_file: PathBuf::from("output/capacityOffset.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}
