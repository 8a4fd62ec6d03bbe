use cap_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const TYPO_YAML: &str = r#"
stream:
  batchsize: 100
  read_timeout_ms: 5000
output:
  dir: "reports"
"#;

#[test]
fn warn_mode_reports_typos_without_error() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/stream/batchsize".to_string()]);
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err()
        .to_string();
    assert!(err.contains("CONFIG_UNUSED_KEYS"), "{err}");
    assert!(err.contains("/stream/batchsize"), "{err}");
}

#[test]
fn subtree_pointers_consume_every_child() {
    let yaml = r#"
notify:
  profile_icons:
    3x: ":vmware:"
    custom: ":gear:"
fleet_registry:
  urls:
    - "https://fleet-a.example/hosts"
    - "https://fleet-b.example/hosts"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean(), "{:?}", report.unused_leaf_pointers);
}

#[test]
fn unused_pointers_are_sorted() {
    let yaml = "zeta: 1\nalpha: 2\nmid:\n  x: 3\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/alpha".to_string(), "/mid/x".to_string(), "/zeta".to_string()]
    );
}
