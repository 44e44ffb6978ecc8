//! proof-config
//!
//! Layered YAML configuration for audit runs.
//!
//! - Documents merge in order: earlier docs are the base, later docs override.
//! - The merged tree is canonicalized to JSON and hashed (SHA-256) so a run
//!   summary can name the exact configuration it ran under.
//! - Literal secrets are refused; configs carry env var names and hashes only.
//! - [`ProofConfig`] is the typed view every consumer reads.

mod consumption;
mod settings;
mod tree;

pub use consumption::{consumed_pointers, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
pub use settings::{
    AccessSettings, BrowserSettings, ColumnSettings, ConcurrencySettings, ExtractSettings,
    FetchBackend, FetchSettings, InputSettings, PacingSettings, ProofConfig, ReportModeSetting,
    ReportSettings,
};

use std::fs;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::tree::{overlay, Leaves};

// ---------------------------------------------------------------------------
// Secret guard
// ---------------------------------------------------------------------------

/// Credential formats a config value must never start with. Values shorter
/// than [`MIN_SECRET_LEN`] are ignored.
const CREDENTIAL_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
];

const MIN_SECRET_LEN: usize = 8;

fn is_credential_literal(raw: &str) -> bool {
    let s = raw.trim();
    s.len() >= MIN_SECRET_LEN && CREDENTIAL_PREFIXES.iter().any(|p| s.starts_with(p))
}

/// First leaf holding a credential-looking string. The value itself is never
/// put in the error.
fn reject_credentials(merged: &Value) -> Result<()> {
    let leaves = Leaves::of(merged);
    let hit = leaves
        .iter()
        .find(|leaf| leaf.value.as_str().is_some_and(is_credential_literal));
    if let Some(leaf) = hit {
        bail!(
            "CONFIG_SECRET_DETECTED leaf={} value=REDACTED (reference an env var instead)",
            leaf.pointer
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Merged config plus its canonical form and fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 hex of `canonical_json`.
    pub config_hash: String,
    /// Compact JSON with object keys sorted.
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Defaults only: the config an audit runs with when no file is given.
    pub fn empty() -> Result<Self> {
        Self::from_merged(Value::Object(Default::default()))
    }

    /// Typed, validated view of the merged config.
    pub fn settings(&self) -> Result<ProofConfig> {
        ProofConfig::from_json(&self.config_json)
    }

    fn from_merged(merged: Value) -> Result<Self> {
        reject_credentials(&merged)?;
        // serde_json's Map keeps keys sorted, so compact output is canonical.
        let canonical_json =
            serde_json::to_string(&merged).context("canonical json serialize failed")?;
        Ok(Self {
            config_hash: sha256_hex(canonical_json.as_bytes()),
            canonical_json,
            config_json: merged,
        })
    }
}

/// Read and merge YAML files in the order given.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

/// Merge in-memory YAML documents in the order given.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value = serde_yaml::from_str(raw)
            .with_context(|| format!("invalid yaml in config layer {}", i + 1))?;
        // Blank or comment-only documents carry no overrides.
        if layer.is_null() {
            continue;
        }
        let layer = serde_json::to_value(layer)
            .with_context(|| format!("config layer {} is not representable as json", i + 1))?;
        overlay(&mut merged, layer);
    }
    LoadedConfig::from_merged(merged)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_docs_override_earlier_ones() {
        let base = "pacing:\n  enabled: true\n  delay_ms: 1000\n";
        let over = "pacing:\n  delay_ms: 250\n";
        let loaded = load_layered_yaml_from_strings(&[base, over]).unwrap();
        assert_eq!(loaded.config_json["pacing"]["delay_ms"], 250);
        assert_eq!(loaded.config_json["pacing"]["enabled"], true);
    }

    #[test]
    fn empty_documents_are_ignored() {
        let loaded = load_layered_yaml_from_strings(&["", "# only a comment\n"]).unwrap();
        assert_eq!(loaded.canonical_json, "{}");
        assert_eq!(loaded.config_hash, LoadedConfig::empty().unwrap().config_hash);
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn short_values_are_never_secrets() {
        assert!(!is_credential_literal("sk-1"));
        assert!(is_credential_literal("  ghp_abcdefghijkl"));
    }

    #[test]
    fn bad_layer_is_named() {
        let err = load_layered_yaml_from_strings(&["a: 1\n", "b: [unclosed\n"]).unwrap_err();
        assert!(err.to_string().contains("layer 2"));
    }
}
