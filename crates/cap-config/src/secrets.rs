//! Runtime secret resolution.
//!
//! Config stores env var NAMES. [`resolve_secrets`] reads them once at
//! startup; the result is handed to constructors. Errors name the variable,
//! never its value, and `Debug` redacts every secret.

use anyhow::{bail, Result};

use crate::settings::{SourceKind, WorkerConfig};

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Inventory API key. Always required.
    pub inventory_api_key: String,
    /// Stream credentials. Present only for `source: kafka`.
    pub kafka_username: Option<String>,
    pub kafka_password: Option<String>,
    /// Slack bot token and channel. Both present or both `None`.
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
    pub fleet_username: Option<String>,
    pub fleet_api_key: Option<String>,
}

impl ResolvedSecrets {
    pub fn slack(&self) -> Option<(&str, &str)> {
        match (&self.slack_token, &self.slack_channel) {
            (Some(t), Some(c)) => Some((t.as_str(), c.as_str())),
            _ => None,
        }
    }

    pub fn fleet(&self) -> Option<(&str, &str)> {
        match (&self.fleet_username, &self.fleet_api_key) {
            (Some(u), Some(k)) => Some((u.as_str(), k.as_str())),
            _ => None,
        }
    }
}

fn redact(v: &Option<String>) -> Option<&'static str> {
    v.as_ref().map(|_| "<REDACTED>")
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("inventory_api_key", &"<REDACTED>")
            .field("kafka_username", &redact(&self.kafka_username))
            .field("kafka_password", &redact(&self.kafka_password))
            .field("slack_token", &redact(&self.slack_token))
            .field("slack_channel", &redact(&self.slack_channel))
            .field("fleet_username", &redact(&self.fleet_username))
            .field("fleet_api_key", &redact(&self.fleet_api_key))
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve from the process environment.
pub fn resolve_secrets(cfg: &WorkerConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(cfg, resolve_env)
}

/// Resolve through `lookup`, which returns `None` for unset or blank vars.
pub fn resolve_secrets_with<F>(cfg: &WorkerConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            lookup(name).filter(|v| !v.trim().is_empty())
        }
    };

    let mut missing: Vec<&str> = Vec::new();

    let inventory_api_key = get(&cfg.inventory.api_key_env);
    if inventory_api_key.is_none() {
        missing.push(cfg.inventory.api_key_env.as_str());
    }

    let (kafka_username, kafka_password) = match cfg.stream.source {
        SourceKind::Kafka => {
            let u = get(&cfg.stream.kafka.username_env);
            let p = get(&cfg.stream.kafka.password_env);
            if u.is_none() {
                missing.push(cfg.stream.kafka.username_env.as_str());
            }
            if p.is_none() {
                missing.push(cfg.stream.kafka.password_env.as_str());
            }
            (u, p)
        }
        SourceKind::Jsonl => (None, None),
    };

    if !missing.is_empty() {
        bail!(
            "SECRETS_MISSING: required env var(s) not set: {}",
            missing.join(", ")
        );
    }

    // Half-configured optional pairs collapse to None.
    let slack_token = get(&cfg.notify.slack.token_env);
    let slack_channel = get(&cfg.notify.slack.channel_env);
    let (slack_token, slack_channel) = match (slack_token, slack_channel) {
        (Some(t), Some(c)) => (Some(t), Some(c)),
        _ => (None, None),
    };

    let fleet_username = get(&cfg.fleet_registry.username_env);
    let fleet_api_key = get(&cfg.fleet_registry.api_key_env);
    let (fleet_username, fleet_api_key) = match (fleet_username, fleet_api_key) {
        (Some(u), Some(k)) => (Some(u), Some(k)),
        _ => (None, None),
    };

    Ok(ResolvedSecrets {
        inventory_api_key: inventory_api_key.unwrap_or_default(),
        kafka_username,
        kafka_password,
        slack_token,
        slack_channel,
        fleet_username,
        fleet_api_key,
    })
}
