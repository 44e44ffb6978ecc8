//! Audit orchestration
//!
//! Runs on tokio's paused clock, so pacing delays and scripted fetch
//! latencies cost no wall time and elapsed times are exact.
//!
//! # Invariants under test
//!
//! 1. Reports reach the aggregator in plan order, whatever order fetches
//!    complete in.
//! 2. Sequential mode waits the pacing delay between fetches.
//! 3. Parallel mode never exceeds the worker bound and spaces request starts.
//! 4. A failed fetch becomes one FetchFailed row; other categories still run.
//! 5. Cancellation stops new fetches, lets in-flight ones finish and be
//!    reported, and lists the categories never run.

use std::sync::Arc;
use std::time::Duration;

use proof_cli::{run_audit, AuditOptions, CancelToken, PacingPolicy, RunPlan};
use proof_fetch::FetchError;
use proof_reconcile::DiagnosticKind;
use proof_report::{ReportMode, ReportStyle};
use proof_schemas::CategoryId;
use proof_testkit::{category, roster, ScriptedFetcher};
use tokio::time::Instant;

fn plan(paths: &[&str]) -> (RunPlan, Vec<CategoryId>) {
    let ids: Vec<CategoryId> = paths.iter().map(|p| category(p)).collect();
    let categories = ids
        .iter()
        .map(|id| (id.clone(), roster(id, &[("Acme Plumbing", "5 Years")])))
        .collect();
    (RunPlan { categories }, ids)
}

fn ok_page(f: ScriptedFetcher, id: &CategoryId) -> ScriptedFetcher {
    f.page(id.url(), vec![("Acme Plumbing", "5 Years")])
}

fn opts(workers: usize, delay_ms: u64) -> AuditOptions {
    AuditOptions {
        workers,
        pacing: PacingPolicy {
            delay: Duration::from_millis(delay_ms),
        },
        style: ReportStyle::default(),
    }
}

fn ids_of(outcome: &proof_cli::AuditOutcome) -> Vec<CategoryId> {
    outcome
        .aggregator
        .reports()
        .iter()
        .map(|r| r.category_id.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn sequential_run_paces_and_keeps_plan_order() {
    let (plan, ids) = plan(&["a/one", "a/two", "a/three"]);
    let fetcher = ids.iter().fold(ScriptedFetcher::new(), ok_page);
    let fetcher = Arc::new(fetcher);

    let started = Instant::now();
    let outcome = run_audit(plan, fetcher.clone(), opts(1, 1_000), CancelToken::new()).await;

    // two gaps between three fetches, no trailing wait
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2_000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3_000), "{elapsed:?}");
    assert_eq!(ids_of(&outcome), ids);
    assert_eq!(
        fetcher.calls(),
        ids.iter().map(|i| i.url().to_string()).collect::<Vec<_>>()
    );
    assert_eq!(fetcher.max_in_flight(), 1);

    let s = outcome.aggregator.summary();
    assert_eq!(s.total_categories, 3);
    assert_eq!(s.passing_categories, 3);
    assert!(!outcome.cancelled);
    assert!(outcome.categories_not_run.is_empty());
}

#[tokio::test(start_paused = true)]
async fn parallel_completion_order_does_not_leak_into_report() {
    let (plan, ids) = plan(&["b/one", "b/two", "b/three", "b/four"]);
    // earlier categories answer later
    let fetcher = ids
        .iter()
        .enumerate()
        .fold(ScriptedFetcher::new(), |f, (i, id)| {
            ok_page(f, id).delayed(id.url(), Duration::from_millis(400 - 100 * i as u64))
        });
    let fetcher = Arc::new(fetcher);

    let outcome = run_audit(plan, fetcher.clone(), opts(3, 0), CancelToken::new()).await;

    assert_eq!(ids_of(&outcome), ids);
    assert!(fetcher.max_in_flight() <= 3);
    assert!(fetcher.max_in_flight() > 1);
}

#[tokio::test(start_paused = true)]
async fn parallel_request_starts_are_spaced() {
    let (plan, ids) = plan(&["c/one", "c/two", "c/three", "c/four"]);
    let fetcher = Arc::new(ids.iter().fold(ScriptedFetcher::new(), ok_page));

    let started = Instant::now();
    let outcome = run_audit(plan, fetcher, opts(4, 500), CancelToken::new()).await;

    assert_eq!(outcome.aggregator.len(), 4);
    assert!(started.elapsed() >= Duration::from_millis(1_500));
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_isolated() {
    let (plan, ids) = plan(&["d/one", "d/two", "d/three"]);
    let fetcher = ScriptedFetcher::new();
    let fetcher = ok_page(fetcher, &ids[0]);
    let fetcher = fetcher.failing(ids[1].url(), FetchError::Timeout { secs: 10 });
    let fetcher = ok_page(fetcher, &ids[2]);

    let outcome = run_audit(plan, Arc::new(fetcher), opts(2, 0), CancelToken::new()).await;

    let reports = outcome.aggregator.reports();
    assert_eq!(reports.len(), 3);
    assert!(reports[0].is_pass());
    assert_eq!(reports[1].diagnostics.len(), 1);
    assert_eq!(reports[1].count_of(DiagnosticKind::FetchFailed), 1);
    assert!(reports[2].is_pass());

    let rows = outcome.aggregator.rows();
    assert_eq!(rows[1].errors, "ERROR: timed out after 10s");
}

#[tokio::test(start_paused = true)]
async fn failing_only_style_flows_through() {
    let (plan, ids) = plan(&["e/one", "e/two"]);
    let fetcher = ok_page(ScriptedFetcher::new(), &ids[0]);
    // e/two unscripted: 404

    let mut o = opts(1, 0);
    o.style = ReportStyle {
        mode: ReportMode::FailingOnly,
        ..ReportStyle::default()
    };
    let outcome = run_audit(plan, Arc::new(fetcher), o, CancelToken::new()).await;

    let rows = outcome.aggregator.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category_id, ids[1]);
    assert!(rows[0].errors.starts_with("ERROR: HTTP 404"));
    assert_eq!(outcome.aggregator.summary().total_categories, 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_start_runs_nothing() {
    let (plan, ids) = plan(&["f/one", "f/two"]);
    let fetcher = Arc::new(ids.iter().fold(ScriptedFetcher::new(), ok_page));
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = run_audit(plan, fetcher.clone(), opts(1, 0), cancel).await;

    assert!(outcome.cancelled);
    assert!(outcome.aggregator.is_empty());
    assert_eq!(outcome.categories_not_run, ids);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_during_pacing_sleep_stops_sequential_run() {
    let (plan, ids) = plan(&["g/one", "g/two", "g/three", "g/four"]);
    let fetcher = Arc::new(ids.iter().fold(ScriptedFetcher::new(), ok_page));
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        trigger.cancel();
    });

    // fetches at t=0 and t=1000; the sleep toward t=2000 is interrupted
    let outcome = run_audit(plan, fetcher.clone(), opts(1, 1_000), cancel).await;

    assert!(outcome.cancelled);
    assert_eq!(ids_of(&outcome), ids[..2].to_vec());
    assert_eq!(outcome.categories_not_run, ids[2..].to_vec());
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn in_flight_fetches_finish_after_cancel() {
    let (plan, ids) = plan(&["h/one", "h/two", "h/three", "h/four"]);
    let fetcher = ids.iter().fold(ScriptedFetcher::new(), |f, id| {
        ok_page(f, id).delayed(id.url(), Duration::from_secs(5))
    });
    let fetcher = Arc::new(fetcher);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let outcome = run_audit(plan, fetcher.clone(), opts(2, 0), cancel).await;

    assert!(outcome.cancelled);
    // both in-flight fetches completed and were reported
    assert_eq!(ids_of(&outcome), ids[..2].to_vec());
    assert!(outcome.aggregator.reports().iter().all(|r| r.is_pass()));
    assert_eq!(outcome.categories_not_run, ids[2..].to_vec());
}
