use std::collections::BTreeMap;

use proof_reconcile::CategoryReport;
use proof_schemas::CategoryId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Which categories get a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// One row per category; passing ones carry the "no issues" sentinel.
    AllCategories,
    /// Rows only for categories with at least one diagnostic.
    FailingOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStyle {
    pub mode: ReportMode,
    pub separator: String,
    pub no_issues_text: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            mode: ReportMode::AllCategories,
            separator: "; ".to_string(),
            no_issues_text: "No issues".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub category_id: CategoryId,
    pub errors: String,
}

/// Counts over every pushed category, independent of [`ReportMode`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_categories: usize,
    pub failing_categories: usize,
    pub passing_categories: usize,
    /// Sum of diagnostic counts across categories.
    pub total_diagnostics: usize,
    /// Diagnostic count per kind (`fetch_failed`, `missing_entry`, ...).
    pub by_kind: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Single-writer accumulator. Push order is row order.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    style: ReportStyle,
    reports: Vec<CategoryReport>,
}

impl ReportAggregator {
    pub fn new(style: ReportStyle) -> Self {
        Self {
            style,
            reports: Vec::new(),
        }
    }

    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    pub fn push(&mut self, report: CategoryReport) {
        self.reports.push(report);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn reports(&self) -> &[CategoryReport] {
        &self.reports
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.reports
            .iter()
            .filter(|r| self.style.mode == ReportMode::AllCategories || !r.is_pass())
            .map(|r| ReportRow {
                category_id: r.category_id.clone(),
                errors: self.render(r),
            })
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        let mut s = ReportSummary {
            total_categories: self.reports.len(),
            ..ReportSummary::default()
        };
        for r in &self.reports {
            if r.is_pass() {
                s.passing_categories += 1;
            } else {
                s.failing_categories += 1;
            }
            s.total_diagnostics += r.diagnostics.len();
            for d in &r.diagnostics {
                *s.by_kind.entry(d.kind().as_str().to_string()).or_insert(0) += 1;
            }
        }
        s
    }

    fn render(&self, r: &CategoryReport) -> String {
        if r.is_pass() {
            return self.style.no_issues_text.clone();
        }
        r.diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(&self.style.separator)
    }
}
