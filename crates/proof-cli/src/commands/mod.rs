//! Command handlers for the `proof` binary.
//!
//! Shared loading helpers live here; command-specific logic lives in the
//! submodules.

pub mod roster;
pub mod run;

use anyhow::{Context, Result};
use proof_config::{
    load_layered_yaml, report_unused_keys, ColumnSettings, LoadedConfig, ProofConfig,
    UnusedKeyPolicy,
};
use proof_roster::ColumnMap;
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Merge the `--config` layers (none means defaults) and check for unused keys.
pub fn load_config(paths: &[String], strict: bool) -> Result<(LoadedConfig, ProofConfig)> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        load_layered_yaml(&refs)?
    };

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = report_unused_keys(&loaded.config_json, policy)?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(key = %ptr, "config key is not used");
    }

    let settings = loaded.settings().context("config rejected")?;
    Ok((loaded, settings))
}

pub fn column_map(cols: &ColumnSettings) -> ColumnMap {
    ColumnMap {
        profile_url: cols.profile_url.clone(),
        name: cols.name.clone(),
        sort_date: cols.sort_date.clone(),
        badge_text: cols.badge_text.clone(),
    }
}
