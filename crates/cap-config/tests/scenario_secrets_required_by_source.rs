use std::collections::HashMap;

use cap_config::{resolve_secrets_with, SourceKind, WorkerConfig};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn inventory_key_is_always_required() {
    let cfg = WorkerConfig::default();
    let err = resolve_secrets_with(&cfg, env(&[])).unwrap_err().to_string();
    assert!(err.contains("SECRETS_MISSING"), "{err}");
    assert!(err.contains("OPAAS_APIKEY"), "{err}");
}

#[test]
fn jsonl_source_needs_no_stream_credentials() {
    let cfg = WorkerConfig::default();
    let s = resolve_secrets_with(&cfg, env(&[("OPAAS_APIKEY", "k-123")])).unwrap();
    assert_eq!(s.inventory_api_key, "k-123");
    assert!(s.kafka_username.is_none());
    assert!(s.slack().is_none());
    assert!(s.fleet().is_none());
}

#[test]
fn kafka_source_requires_both_stream_credentials() {
    let mut cfg = WorkerConfig::default();
    cfg.stream.source = SourceKind::Kafka;
    let err = resolve_secrets_with(
        &cfg,
        env(&[("OPAAS_APIKEY", "k-123"), ("CAP_KAFKA_USER", "capacity")]),
    )
    .unwrap_err()
    .to_string();
    assert!(err.contains("CAP_KAFKA_PASSWORD"), "{err}");
    assert!(!err.contains("CAP_KAFKA_USER"), "{err}");
}

#[test]
fn blank_values_count_as_missing() {
    let cfg = WorkerConfig::default();
    assert!(resolve_secrets_with(&cfg, env(&[("OPAAS_APIKEY", "   ")])).is_err());
}

#[test]
fn half_configured_slack_is_disabled() {
    let cfg = WorkerConfig::default();
    let s = resolve_secrets_with(
        &cfg,
        env(&[("OPAAS_APIKEY", "k"), ("CAPACITY_SLACK_TOKEN", "tok")]),
    )
    .unwrap();
    assert!(s.slack().is_none());

    let s = resolve_secrets_with(
        &cfg,
        env(&[
            ("OPAAS_APIKEY", "k"),
            ("CAPACITY_SLACK_TOKEN", "tok"),
            ("CAPACITY_SLACK_CHANNEL", "#capacity"),
        ]),
    )
    .unwrap();
    assert_eq!(s.slack(), Some(("tok", "#capacity")));
}

#[test]
fn debug_output_redacts_values() {
    let cfg = WorkerConfig::default();
    let s = resolve_secrets_with(
        &cfg,
        env(&[
            ("OPAAS_APIKEY", "super-secret-key"),
            ("CAPACITY_SLACK_TOKEN", "slack-secret"),
            ("CAPACITY_SLACK_CHANNEL", "#capacity"),
        ]),
    )
    .unwrap();
    let dbg = format!("{s:?}");
    assert!(!dbg.contains("super-secret-key"), "{dbg}");
    assert!(!dbg.contains("slack-secret"), "{dbg}");
    assert!(dbg.contains("<REDACTED>"));
}
