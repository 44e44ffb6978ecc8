use std::fmt;

use proof_schemas::CategoryId;
use serde::{Deserialize, Serialize};

/// Which finding a [`Diagnostic`] is, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    FetchFailed,
    UnexpectedEntry,
    MissingEntry,
    OrderMismatch,
    BadgeMismatch,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::FetchFailed => "fetch_failed",
            DiagnosticKind::UnexpectedEntry => "unexpected_entry",
            DiagnosticKind::MissingEntry => "missing_entry",
            DiagnosticKind::OrderMismatch => "order_mismatch",
            DiagnosticKind::BadgeMismatch => "badge_mismatch",
        }
    }
}

/// One finding for a category.
///
/// Names carried here are display names (trimmed), not comparison keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    FetchFailed {
        message: String,
    },
    UnexpectedEntry {
        name: String,
    },
    MissingEntry {
        name: String,
    },
    OrderMismatch {
        name: String,
        expected_rank: u32,
        observed_position: u32,
    },
    BadgeMismatch {
        name: String,
        expected: String,
        observed: String,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::FetchFailed { .. } => DiagnosticKind::FetchFailed,
            Diagnostic::UnexpectedEntry { .. } => DiagnosticKind::UnexpectedEntry,
            Diagnostic::MissingEntry { .. } => DiagnosticKind::MissingEntry,
            Diagnostic::OrderMismatch { .. } => DiagnosticKind::OrderMismatch,
            Diagnostic::BadgeMismatch { .. } => DiagnosticKind::BadgeMismatch,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FetchFailed { message } => write!(f, "ERROR: {message}"),
            Diagnostic::UnexpectedEntry { name } => write!(f, "Unexpected company: {name}"),
            Diagnostic::MissingEntry { name } => write!(f, "Missing company: {name}"),
            Diagnostic::OrderMismatch {
                name,
                expected_rank,
                observed_position,
            } => write!(
                f,
                "Wrong order: {name} (expected position {expected_rank}, found {observed_position})"
            ),
            Diagnostic::BadgeMismatch {
                name,
                expected,
                observed,
            } => write!(
                f,
                "Wrong years: {name} - Expected '{expected}' but found '{observed}'"
            ),
        }
    }
}

/// All findings for one category, in emission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category_id: CategoryId,
    pub diagnostics: Vec<Diagnostic>,
}

impl CategoryReport {
    pub fn new(category_id: CategoryId, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            category_id,
            diagnostics,
        }
    }

    /// A category passes when nothing was found.
    pub fn is_pass(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind() == kind).count()
    }
}
