//! proof-schemas
//!
//! Shared shapes passed between the roster builder, the fetch adapters, the
//! reconciliation engine and the report aggregator. No logic beyond small
//! constructors and name normalization lives here.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CategoryId
// ---------------------------------------------------------------------------

/// Canonical category URL prefix (e.g. `https://example.com/plumbers/atlanta`).
///
/// Ordering is lexicographic on the prefix, which is what makes roster maps
/// keyed by `CategoryId` iterate deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The category id doubles as the page URL handed to a fetch adapter.
    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Roster side
// ---------------------------------------------------------------------------

/// One expected appearance of a company within one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub category_id: CategoryId,
    pub published_name: String,
    /// Expected tenure label; may be empty.
    pub expected_badge_text: String,
    /// Signing timestamp; `None` when the source date could not be parsed
    /// (sorts last).
    pub sort_key: Option<NaiveDateTime>,
    /// 1-based rank within the category. Fixed once the roster is built.
    pub rank: u32,
    /// 1-based data-row index in the input file.
    pub source_row: usize,
}

// ---------------------------------------------------------------------------
// Observed side
// ---------------------------------------------------------------------------

/// One listing scraped from a live category page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEntry {
    pub raw_name: String,
    pub raw_badge_text: String,
    /// 1-based position in rendering order.
    pub position: u32,
}

impl ObservedEntry {
    pub fn new(raw_name: impl Into<String>, raw_badge_text: impl Into<String>, position: u32) -> Self {
        Self {
            raw_name: raw_name.into(),
            raw_badge_text: raw_badge_text.into(),
            position,
        }
    }

    /// Number `(name, badge)` pairs 1..N in the order given.
    pub fn sequence<N, B, I>(pairs: I) -> Vec<ObservedEntry>
    where
        N: Into<String>,
        B: Into<String>,
        I: IntoIterator<Item = (N, B)>,
    {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (name, badge))| ObservedEntry::new(name, badge, i as u32 + 1))
            .collect()
    }
}

/// A fetch that did not produce a listing. Carries a human-readable cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub message: String,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What the reconciliation engine receives for one category page.
pub type Observed = Result<Vec<ObservedEntry>, FetchFailure>;

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Comparison key for company names: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
