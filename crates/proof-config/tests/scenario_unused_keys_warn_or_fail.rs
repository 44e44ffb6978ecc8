//! Unused config keys
//!
//! # Invariants under test
//!
//! 1. Warn policy reports unused leaves without erroring.
//! 2. Fail policy errors with CONFIG_UNUSED_KEYS.
//! 3. A misspelled key inside a known section is still unused.
//! 4. Array elements under a consumed key are consumed.
//! 5. Unused pointers are sorted.

use proof_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_without_error() {
    let yaml = r#"
pacing:
  delay_ms: 500
legacy:
  b: 2
  a: 1
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/legacy/a".to_string(), "/legacy/b".to_string()]
    );
}

#[test]
fn fail_mode_errors() {
    let yaml = "legacy:\n  foo: 1\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = format!("{err:?}");
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("/legacy/foo"), "got: {msg}");
}

#[test]
fn typo_inside_known_section_is_caught() {
    let yaml = "pacing:\n  delay_msec: 500\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/pacing/delay_msec".to_string()]);
}

#[test]
fn full_config_is_clean() {
    let yaml = r#"
input:
  category_depth: 5
  columns:
    profile_url: "Company Web Profile URL"
    name: PublishedName
    sort_date: "Oldest Signing Date"
    badge_text: OldestBestPickText
fetch:
  backend: browser
  timeout_secs: 20
  user_agent: "proof-audit"
  extract:
    card_classes: [provider-summary, company-card]
    name_tag: h3
    badge_classes: [years, badge]
  browser:
    command: chromium
    args: ["--headless", "--dump-dom"]
pacing:
  enabled: true
  delay_ms: 1000
  max_delay_ms: 5000
concurrency:
  workers: 2
report:
  mode: failing_only
  separator: "; "
  no_issues_text: "No issues"
access:
  operator_token_sha256: null
  token_env: PROOF_OPERATOR_TOKEN
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert!(loaded.settings().is_ok());
}
