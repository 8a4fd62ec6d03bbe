//! Builds the production collaborators from config + resolved secrets.

use std::sync::Arc;

use anyhow::{Context, Result};
use cap_config::{ResolvedSecrets, SourceKind, WorkerConfig};
use cap_inventory::{
    FleetCredentials, FleetRegistrySource, HttpFleetRegistry, HttpInventoryClient,
    InventoryClientOptions,
};
use cap_notify::{LogNotifier, Notifier, ProfileIcons, SlackNotifier};
use cap_reconcile::ReconcileOptions;
use cap_runtime::{Collaborators, JsonlSource, LoopSettings, RecordSource};
use cap_store::{CsvReportSink, FileCheckpoint};
use tracing::info;

pub fn loop_settings(cfg: &WorkerConfig) -> LoopSettings {
    LoopSettings {
        batch_size: cfg.stream.batch_size,
        read_timeout: cfg.stream.read_timeout(),
        options: ReconcileOptions {
            capacity_alerts: cfg.notify.capacity_alerts,
        },
    }
}

pub fn collaborators(cfg: &WorkerConfig, secrets: &ResolvedSecrets) -> Result<Collaborators> {
    let inventory = HttpInventoryClient::new(
        cfg.inventory.base_url.clone(),
        secrets.inventory_api_key.clone(),
        InventoryClientOptions {
            accept_invalid_certs: cfg.inventory.accept_invalid_certs,
            timeout: cfg.inventory.timeout(),
        },
    )
    .context("inventory client")?;

    Ok(Collaborators {
        source: record_source(cfg, secrets)?,
        inventory: Arc::new(inventory),
        fleet: fleet_registry(cfg, secrets)?,
        notifier: notifier(cfg, secrets)?,
        reports: Box::new(CsvReportSink::new(&cfg.output.dir)?),
        checkpoint: Box::new(FileCheckpoint::new(&cfg.output.offset_file)),
    })
}

fn fleet_registry(
    cfg: &WorkerConfig,
    secrets: &ResolvedSecrets,
) -> Result<Option<Arc<dyn FleetRegistrySource>>> {
    let fr = &cfg.fleet_registry;
    if fr.urls.is_empty() {
        info!("no fleet registry configured; cluster hosts will not be matched");
        return Ok(None);
    }
    let credentials = secrets.fleet().map(|(username, api_key)| FleetCredentials {
        username: username.to_string(),
        api_key: api_key.to_string(),
    });
    let registry = HttpFleetRegistry::new(
        fr.urls.clone(),
        credentials,
        fr.accept_invalid_certs,
        fr.timeout(),
    )
    .context("fleet registry client")?;
    Ok(Some(Arc::new(registry)))
}

fn notifier(cfg: &WorkerConfig, secrets: &ResolvedSecrets) -> Result<Arc<dyn Notifier>> {
    let icons = ProfileIcons::with_overrides(cfg.notify.profile_icons.clone());
    match secrets.slack() {
        Some((token, channel)) => {
            let slack = SlackNotifier::new(
                token.to_string(),
                channel.to_string(),
                icons,
                cfg.notify.slack.timeout(),
            )
            .context("slack notifier")?;
            info!(channel, "notifications go to slack");
            Ok(Arc::new(slack))
        }
        None => {
            info!("slack not configured; notifications are logged only");
            Ok(Arc::new(LogNotifier::new(icons)))
        }
    }
}

fn record_source(cfg: &WorkerConfig, secrets: &ResolvedSecrets) -> Result<Box<dyn RecordSource>> {
    match cfg.stream.source {
        SourceKind::Jsonl => {
            info!(path = %cfg.stream.jsonl_path.display(), "reading records from jsonl file");
            Ok(Box::new(JsonlSource::new(&cfg.stream.jsonl_path)))
        }
        SourceKind::Kafka => kafka_source(cfg, secrets),
    }
}

#[cfg(feature = "kafka")]
fn kafka_source(cfg: &WorkerConfig, secrets: &ResolvedSecrets) -> Result<Box<dyn RecordSource>> {
    use cap_runtime::{KafkaSource, KafkaSourceConfig};

    let k = &cfg.stream.kafka;
    let source = KafkaSource::new(&KafkaSourceConfig {
        brokers: k.brokers.clone(),
        topic: k.topic.clone(),
        partition: k.partition,
        group_id: k.group_id.clone(),
        username: secrets.kafka_username.clone().unwrap_or_default(),
        password: secrets.kafka_password.clone().unwrap_or_default(),
        max_wait: std::time::Duration::from_millis(500),
    })
    .context("kafka source")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "kafka"))]
fn kafka_source(_cfg: &WorkerConfig, _secrets: &ResolvedSecrets) -> Result<Box<dyn RecordSource>> {
    anyhow::bail!("stream.source=kafka requires a build with `--features kafka`")
}
