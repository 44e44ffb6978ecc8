//! `proof run`: full audit of every category in the dataset.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use proof_config::{FetchBackend, ProofConfig, ReportModeSetting};
use proof_fetch::{fetcher_from_settings, PageFetcher};
use proof_report::{
    default_output_name, write_rows_csv, write_summary_json, ReportMode, ReportStyle, RunSummary,
};
use proof_roster::{build_rosters, load_dataset};
use tracing::info;
use uuid::Uuid;

use super::{column_map, load_config};
use crate::access::check_operator_access;
use crate::cancel::CancelToken;
use crate::orchestrate::{run_audit, AuditOptions, PacingPolicy, RunPlan};

/// CLI inputs for a run. `None` means "use the config value".
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub input: PathBuf,
    pub config_paths: Vec<String>,
    pub out: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub failing_only: bool,
    pub backend: Option<String>,
    pub workers: Option<usize>,
    pub delay_ms: Option<u64>,
    pub no_rate_limit: bool,
    pub strict_config: bool,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub summary: RunSummary,
    pub report_path: PathBuf,
}

/// Flags win over config; the merged result is validated again.
pub fn apply_overrides(mut cfg: ProofConfig, args: &RunArgs) -> Result<ProofConfig> {
    if let Some(b) = &args.backend {
        cfg.fetch.backend = FetchBackend::parse(b)?;
    }
    if let Some(w) = args.workers {
        cfg.concurrency.workers = w;
    }
    if let Some(d) = args.delay_ms {
        cfg.pacing.delay_ms = d;
    }
    if args.no_rate_limit {
        cfg.pacing.enabled = false;
    }
    if args.failing_only {
        cfg.report.mode = ReportModeSetting::FailingOnly;
    }
    cfg.validate().context("command-line overrides rejected")?;
    Ok(cfg)
}

pub fn report_style(cfg: &ProofConfig) -> ReportStyle {
    ReportStyle {
        mode: match cfg.report.mode {
            ReportModeSetting::All => ReportMode::AllCategories,
            ReportModeSetting::FailingOnly => ReportMode::FailingOnly,
        },
        separator: cfg.report.separator.clone(),
        no_issues_text: cfg.report.no_issues_text.clone(),
    }
}

pub async fn execute(args: RunArgs, cancel: CancelToken) -> Result<RunResult> {
    let (loaded, settings) = load_config(&args.config_paths, args.strict_config)?;
    let settings = apply_overrides(settings, &args)?;
    let fetcher = fetcher_from_settings(&settings.fetch).context("fetch backend setup failed")?;
    execute_with(args, loaded.config_hash, settings, fetcher, cancel).await
}

/// Same as [`execute`] with an already resolved config and fetch backend.
pub async fn execute_with(
    args: RunArgs,
    config_hash: String,
    settings: ProofConfig,
    fetcher: Arc<dyn PageFetcher>,
    cancel: CancelToken,
) -> Result<RunResult> {
    check_operator_access(&settings.access)?;

    let dataset = load_dataset(&args.input, &column_map(&settings.input.columns))
        .with_context(|| format!("failed to load dataset: {}", args.input.display()))?;
    let rosters = build_rosters(&dataset, settings.input.category_depth);
    info!(
        rows_read = rosters.rows_read,
        rows_skipped = rosters.rows_skipped(),
        categories = rosters.category_count(),
        entries = rosters.entry_count(),
        "rosters built"
    );

    let backend = fetcher.backend_name().to_string();
    let opts = AuditOptions {
        workers: settings.concurrency.workers,
        pacing: PacingPolicy::from_settings(&settings.pacing),
        style: report_style(&settings),
    };

    let started_at_utc = Utc::now();
    let outcome = run_audit(RunPlan::from_rosters(&rosters), fetcher, opts, cancel).await;
    let finished_at_utc = Utc::now();

    let report_path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_name(finished_at_utc.date_naive())));
    write_rows_csv(&report_path, &outcome.aggregator.rows())?;

    let summary = RunSummary {
        run_id: Uuid::new_v4(),
        started_at_utc,
        finished_at_utc,
        config_hash,
        backend,
        rows_read: rosters.rows_read,
        rows_skipped: rosters.rows_skipped(),
        cancelled: outcome.cancelled,
        categories_not_run: outcome.categories_not_run,
        counts: outcome.aggregator.summary(),
    };
    if let Some(path) = &args.summary_json {
        write_summary_json(path, &summary)?;
    }

    info!(
        report = %report_path.display(),
        failing = summary.counts.failing_categories,
        diagnostics = summary.counts.total_diagnostics,
        "audit finished"
    );

    Ok(RunResult {
        summary,
        report_path,
    })
}

pub fn print(result: &RunResult) {
    let s = &result.summary;
    println!("run_id={}", s.run_id);
    println!("config_hash={}", s.config_hash);
    println!("backend={}", s.backend);
    println!("rows_read={}", s.rows_read);
    println!("rows_skipped={}", s.rows_skipped);
    println!("categories_total={}", s.counts.total_categories);
    println!("categories_failing={}", s.counts.failing_categories);
    println!("categories_passing={}", s.counts.passing_categories);
    println!("diagnostics_total={}", s.counts.total_diagnostics);
    for (kind, n) in &s.counts.by_kind {
        println!("diagnostics_{kind}={n}");
    }
    println!("cancelled={}", s.cancelled);
    println!("categories_not_run={}", s.categories_not_run.len());
    println!("report_path={}", result.report_path.display());
}
