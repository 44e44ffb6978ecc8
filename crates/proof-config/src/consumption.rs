//! Unused-key detection.
//!
//! [`SETTINGS_READ`] lists every JSON pointer [`crate::ProofConfig`]
//! deserializes. A config leaf is accounted for when one of them covers it;
//! array elements such as `/fetch/extract/card_classes/0` are covered by the
//! array's pointer. Any other leaf is a typo or a stale key.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::tree::Leaves;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    /// Report and carry on.
    Warn,
    /// Refuse the config (`--strict-config`).
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedKeyReport {
    /// Pointers the typed settings read, sorted.
    pub consumed_prefixes: Vec<String>,
    /// Leaves present in the config that nothing reads, sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

// Keep in step with settings.rs.
static SETTINGS_READ: &[&str] = &[
    "/input/category_depth",
    "/input/columns/profile_url",
    "/input/columns/name",
    "/input/columns/sort_date",
    "/input/columns/badge_text",
    "/fetch/backend",
    "/fetch/timeout_secs",
    "/fetch/user_agent",
    "/fetch/extract/card_classes",
    "/fetch/extract/name_tag",
    "/fetch/extract/badge_classes",
    "/fetch/browser/command",
    "/fetch/browser/args",
    "/pacing/enabled",
    "/pacing/delay_ms",
    "/pacing/max_delay_ms",
    "/concurrency/workers",
    "/report/mode",
    "/report/separator",
    "/report/no_issues_text",
    "/access/operator_token_sha256",
    "/access/token_env",
];

const PREVIEW_LIMIT: usize = 12;

pub fn consumed_pointers() -> &'static [&'static str] {
    SETTINGS_READ
}

/// Compare the merged config against [`SETTINGS_READ`].
///
/// Under [`UnusedKeyPolicy::Fail`] a non-clean result is a
/// `CONFIG_UNUSED_KEYS` error instead of a report.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let read: BTreeSet<&str> = SETTINGS_READ.iter().copied().collect();

    let leaves = Leaves::of(config_json);
    let unused: BTreeSet<String> = leaves
        .iter()
        .map(|leaf| leaf.pointer)
        .filter(|ptr| !read.iter().any(|r| covers(r, ptr)))
        .map(str::to_string)
        .collect();

    let report = UnusedKeyReport {
        consumed_prefixes: read.into_iter().map(str::to_string).collect(),
        unused_leaf_pointers: unused.into_iter().collect(),
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by anything; \
             remove them or fix the spelling: {}",
            report.unused_leaf_pointers.len(),
            preview(&report.unused_leaf_pointers)
        );
    }

    Ok(report)
}

/// `read` covers `leaf` when they are equal or `leaf` continues past a `/`
/// boundary (`/fetch/backend` does not cover `/fetch/backend_x`).
fn covers(read: &str, leaf: &str) -> bool {
    leaf.strip_prefix(read)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn preview(pointers: &[String]) -> String {
    let mut out = pointers
        .iter()
        .take(PREVIEW_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Some(more) = pointers.len().checked_sub(PREVIEW_LIMIT).filter(|n| *n > 0) {
        out.push_str(&format!(" (+{more} more)"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_respects_segment_boundaries() {
        assert!(covers("/fetch/backend", "/fetch/backend"));
        assert!(covers(
            "/fetch/extract/card_classes",
            "/fetch/extract/card_classes/1"
        ));
        assert!(!covers("/fetch/backend", "/fetch/backend_x"));
        assert!(!covers("/fetch/backend", "/fetch"));
    }

    #[test]
    fn empty_config_is_clean() {
        let r = report_unused_keys(&serde_json::json!({}), UnusedKeyPolicy::Fail).unwrap();
        assert!(r.is_clean());
        assert_eq!(r.consumed_prefixes.len(), SETTINGS_READ.len());
    }

    #[test]
    fn preview_truncates() {
        let items: Vec<String> = (0..PREVIEW_LIMIT + 3).map(|i| format!("/k{i}")).collect();
        let p = preview(&items);
        assert!(p.starts_with("/k0, /k1, "));
        assert!(p.ends_with(" (+3 more)"));
        assert_eq!(preview(&items[..2]), "/k0, /k1");
    }
}
