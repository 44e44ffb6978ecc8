//! Audit orchestration: drives fetches across categories and funnels every
//! result through one collector into the report aggregator.
//!
//! - `workers == 1`: sequential, with the pacing delay between fetches.
//! - `workers > 1`: at most `workers` fetches in flight (semaphore), and
//!   request starts spaced by at least the pacing delay.
//!
//! Either way the aggregator sees categories in plan order, whatever order
//! the fetches complete in. Cancellation stops new fetches; in-flight ones
//! finish and are reported.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use proof_config::PacingSettings;
use proof_fetch::PageFetcher;
use proof_reconcile::{reconcile_category, CategoryReport};
use proof_report::{ReportAggregator, ReportStyle};
use proof_roster::RosterSet;
use proof_schemas::{CategoryId, RosterEntry};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::cancel::CancelToken;

// ---------------------------------------------------------------------------
// Plan + options
// ---------------------------------------------------------------------------

/// Categories to audit, in the order they are fetched and reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    pub categories: Vec<(CategoryId, Vec<RosterEntry>)>,
}

impl RunPlan {
    /// One entry per roster, in category order.
    pub fn from_rosters(set: &RosterSet) -> Self {
        Self {
            categories: set
                .rosters
                .iter()
                .map(|(id, entries)| (id.clone(), entries.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Minimum spacing between request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub delay: Duration,
}

impl PacingPolicy {
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn from_settings(s: &PacingSettings) -> Self {
        if s.enabled {
            Self {
                delay: Duration::from_millis(s.delay_ms),
            }
        } else {
            Self::none()
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::from_settings(&PacingSettings::default())
    }
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub workers: usize,
    pub pacing: PacingPolicy,
    pub style: ReportStyle,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            pacing: PacingPolicy::default(),
            style: ReportStyle::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub aggregator: ReportAggregator,
    pub cancelled: bool,
    /// Plan entries never fetched because the run was cancelled, in plan order.
    pub categories_not_run: Vec<CategoryId>,
}

// ---------------------------------------------------------------------------
// One category
// ---------------------------------------------------------------------------

/// Fetch one category page and reconcile it against its roster.
pub async fn audit_category(
    fetcher: &dyn PageFetcher,
    category: &CategoryId,
    roster: &[RosterEntry],
) -> CategoryReport {
    let observed = fetcher.observe(category.url()).await;
    if let Err(failure) = &observed {
        warn!(category = %category, error = %failure, "fetch failed");
    }
    reconcile_category(category.clone(), roster, &observed)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

struct Completed {
    index: usize,
    report: CategoryReport,
}

type PlanEntries = Arc<Vec<(CategoryId, Vec<RosterEntry>)>>;

pub async fn run_audit(
    plan: RunPlan,
    fetcher: Arc<dyn PageFetcher>,
    opts: AuditOptions,
    cancel: CancelToken,
) -> AuditOutcome {
    let entries: PlanEntries = Arc::new(plan.categories);
    let total = entries.len();
    let workers = opts.workers.max(1);

    info!(
        categories = total,
        workers,
        delay_ms = opts.pacing.delay.as_millis() as u64,
        backend = fetcher.backend_name(),
        "audit starting"
    );

    let (tx, mut rx) = mpsc::channel::<Completed>(workers * 2);
    let dispatcher = tokio::spawn(dispatch(
        Arc::clone(&entries),
        fetcher,
        workers,
        opts.pacing.delay,
        cancel.clone(),
        tx,
    ));

    // Single writer: reorder by plan index, push contiguous prefixes.
    let mut aggregator = ReportAggregator::new(opts.style);
    let mut pending: BTreeMap<usize, CategoryReport> = BTreeMap::new();
    let mut next = 0usize;
    while let Some(done) = rx.recv().await {
        pending.insert(done.index, done.report);
        while let Some(report) = pending.remove(&next) {
            log_report(&report);
            aggregator.push(report);
            next += 1;
        }
    }

    let dispatched = match dispatcher.await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "dispatcher task failed");
            next + pending.len()
        }
    };

    // Only reachable when a fetch task died; keep whatever did arrive.
    for (_, report) in std::mem::take(&mut pending) {
        log_report(&report);
        aggregator.push(report);
    }

    let categories_not_run: Vec<CategoryId> = entries
        .iter()
        .skip(dispatched)
        .map(|(id, _)| id.clone())
        .collect();
    let cancelled = cancel.is_cancelled();
    if cancelled {
        warn!(
            completed = aggregator.len(),
            not_run = categories_not_run.len(),
            "audit cancelled"
        );
    }

    AuditOutcome {
        aggregator,
        cancelled,
        categories_not_run,
    }
}

fn log_report(report: &CategoryReport) {
    if report.is_pass() {
        info!(category = %report.category_id, "category ok");
    } else {
        info!(
            category = %report.category_id,
            diagnostics = report.diagnostics.len(),
            "category has findings"
        );
    }
}

/// Issue fetches in plan order. Returns how many plan entries were started.
async fn dispatch(
    entries: PlanEntries,
    fetcher: Arc<dyn PageFetcher>,
    workers: usize,
    delay: Duration,
    cancel: CancelToken,
    tx: mpsc::Sender<Completed>,
) -> usize {
    if workers <= 1 {
        dispatch_sequential(&entries, fetcher.as_ref(), delay, &cancel, tx).await
    } else {
        dispatch_parallel(entries, fetcher, workers, delay, &cancel, tx).await
    }
}

async fn dispatch_sequential(
    entries: &[(CategoryId, Vec<RosterEntry>)],
    fetcher: &dyn PageFetcher,
    delay: Duration,
    cancel: &CancelToken,
    tx: mpsc::Sender<Completed>,
) -> usize {
    for (index, (category, roster)) in entries.iter().enumerate() {
        if cancel.is_cancelled() {
            return index;
        }
        if index > 0 && !delay.is_zero() && !cancel.sleep(delay).await {
            return index;
        }

        let report = audit_category(fetcher, category, roster).await;
        if tx.send(Completed { index, report }).await.is_err() {
            return index + 1;
        }
    }
    entries.len()
}

async fn dispatch_parallel(
    entries: PlanEntries,
    fetcher: Arc<dyn PageFetcher>,
    workers: usize,
    delay: Duration,
    cancel: &CancelToken,
    tx: mpsc::Sender<Completed>,
) -> usize {
    let permits = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(entries.len());
    let mut last_start: Option<Instant> = None;
    let mut dispatched = 0usize;

    for index in 0..entries.len() {
        if cancel.is_cancelled() {
            break;
        }

        let permit = tokio::select! {
            p = Arc::clone(&permits).acquire_owned() => match p {
                Ok(p) => p,
                Err(_) => break,
            },
            _ = cancel.cancelled() => break,
        };

        if let Some(prev) = last_start {
            let wait = (prev + delay).saturating_duration_since(Instant::now());
            if !wait.is_zero() && !cancel.sleep(wait).await {
                break;
            }
        }
        last_start = Some(Instant::now());
        dispatched = index + 1;

        let fetcher = Arc::clone(&fetcher);
        let entries = Arc::clone(&entries);
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let (category, roster) = &entries[index];
            let report = audit_category(fetcher.as_ref(), category, roster).await;
            let _ = tx.send(Completed { index, report }).await;
        }));
    }
    drop(tx);

    for h in handles {
        if let Err(e) = h.await {
            error!(error = %e, "fetch task failed");
        }
    }
    dispatched
}
