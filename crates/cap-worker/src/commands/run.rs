use anyhow::{Context, Result};
use cap_config::{report_unused_keys, resolve_secrets, UnusedKeyPolicy};
use cap_runtime::{FatalError, IngestionLoop};
use tracing::{error, info, warn};

use super::load_config;
use crate::{telemetry, wiring};

pub async fn run(config_paths: &[String], once: bool, strict_config: bool) -> Result<()> {
    let (loaded, cfg) = load_config(config_paths)?;
    let loaded = loaded.context("at least one --config path is required")?;

    telemetry::init_tracing(cfg.log.format);

    let policy = if strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            pointers = ?report.unused_leaf_pointers,
            "CONFIG_UNUSED_KEYS"
        );
    }

    let secrets = resolve_secrets(&cfg)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        host = %telemetry::host_name(),
        config_hash = %loaded.config_hash,
        source = ?cfg.stream.source,
        batch_size = cfg.stream.batch_size,
        read_timeout_ms = cfg.stream.read_timeout_ms,
        "capacity worker starting"
    );

    let parts = wiring::collaborators(&cfg, &secrets)?;
    let mut ingestion = IngestionLoop::new(wiring::loop_settings(&cfg), parts);

    if once {
        let stats = ingestion.run_once().await.map_err(fatal)?;
        info!(records = stats.records, last_offset = ?stats.last_offset, "single batch done");
        return Ok(());
    }

    tokio::select! {
        res = ingestion.run_forever() => res.map_err(fatal)?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received; next start resumes from the persisted offset");
        }
    }
    Ok(())
}

fn fatal(e: FatalError) -> anyhow::Error {
    error!(error = %e, "fatal error; exiting");
    anyhow::Error::new(e)
}
