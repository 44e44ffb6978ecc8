//! proof-report
//!
//! Collects per-category reconciliation results into report rows and
//! summary counts, and writes them out (CSV rows, JSON run summary).
//!
//! The aggregator only formats and counts what it is given; it never
//! re-derives a diagnostic.

mod aggregate;
mod export;
mod summary;

pub use aggregate::{ReportAggregator, ReportMode, ReportRow, ReportStyle, ReportSummary};
pub use export::{default_output_name, write_rows_csv, write_rows_csv_to};
pub use summary::{write_summary_json, RunSummary};
