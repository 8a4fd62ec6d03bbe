//! Command handlers for cap-worker.

pub mod offset;
pub mod run;

use anyhow::{Context, Result};
use cap_config::{load_layered_yaml, report_unused_keys, LoadedConfig, UnusedKeyPolicy, WorkerConfig};

/// Merged config, or defaults when no paths are given.
pub fn load_config(config_paths: &[String]) -> Result<(Option<LoadedConfig>, WorkerConfig)> {
    if config_paths.is_empty() {
        return Ok((None, WorkerConfig::default()));
    }
    let loaded = load_layered_yaml(config_paths).context("config load failed")?;
    let cfg = loaded.worker_config()?;
    Ok((Some(loaded), cfg))
}

pub fn config_hash(config_paths: &[String]) -> Result<()> {
    let loaded = load_layered_yaml(config_paths)?;
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    println!("config_hash={}", loaded.config_hash);
    println!("unused_keys={}", report.unused_leaf_pointers.len());
    for p in &report.unused_leaf_pointers {
        println!("  unused={p}");
    }
    println!("{}", loaded.canonical_json);
    Ok(())
}
