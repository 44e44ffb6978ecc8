use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use proof_schemas::CategoryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::ReportSummary;

/// Machine-readable record of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at_utc: DateTime<Utc>,
    pub finished_at_utc: DateTime<Utc>,
    pub config_hash: String,
    pub backend: String,
    /// Dataset rows seen, and how many were excluded before ranking.
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub cancelled: bool,
    /// Categories that had a roster but were never fetched (cancelled run).
    pub categories_not_run: Vec<CategoryId>,
    #[serde(flatten)]
    pub counts: ReportSummary,
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let body = serde_json::to_string_pretty(summary).context("run summary serialize failed")?;
    fs::write(path, body + "\n")
        .with_context(|| format!("failed to write run summary: {}", path.display()))
}
