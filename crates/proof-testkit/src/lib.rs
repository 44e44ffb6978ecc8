//! Test fixtures shared by the workspace's scenario tests.
//!
//! - [`ScriptedFetcher`]: a [`PageFetcher`] that answers from a URL table,
//!   optionally after a delay, and records what it was asked and how many
//!   requests overlapped.
//! - Roster and dataset builders.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use proof_fetch::{FetchError, PageFetcher};
use proof_schemas::{CategoryId, ObservedEntry, RosterEntry};

// ---------------------------------------------------------------------------
// Scripted fetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Script {
    response: Result<Vec<ObservedEntry>, FetchError>,
    delay: Duration,
}

/// Unknown URLs answer `HttpStatus 404`.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: BTreeMap<String, Script>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with listings built from `(name, badge)` pairs.
    pub fn page<N, B>(mut self, url: &str, listings: Vec<(N, B)>) -> Self
    where
        N: Into<String>,
        B: Into<String>,
    {
        self.scripts.insert(
            url.to_string(),
            Script {
                response: Ok(ObservedEntry::sequence(listings)),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn failing(mut self, url: &str, err: FetchError) -> Self {
        self.scripts.insert(
            url.to_string(),
            Script {
                response: Err(err),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Delay the answer for an already scripted `url`.
    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        if let Some(s) = self.scripts.get_mut(url) {
            s.delay = delay;
        }
        self
    }

    /// URLs in the order fetches started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of fetches that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, url: &str) -> Result<Vec<ObservedEntry>, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let script = self.scripts.get(url).cloned();
        let delay = script.as_ref().map_or(Duration::ZERO, |s| s.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match script {
            Some(s) => s.response,
            None => Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `https://www.example.com/<path>`
pub fn category(path: &str) -> CategoryId {
    CategoryId::new(format!("https://www.example.com/{}", path.trim_matches('/')))
}

/// Roster with ranks `1..=N` in the order given, undated.
pub fn roster(category_id: &CategoryId, entries: &[(&str, &str)]) -> Vec<RosterEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(i, (name, badge))| RosterEntry {
            category_id: category_id.clone(),
            published_name: name.to_string(),
            expected_badge_text: badge.to_string(),
            sort_key: None,
            rank: i as u32 + 1,
            source_row: i + 1,
        })
        .collect()
}

/// Column headers the dataset loader expects by default.
pub const DATASET_HEADER: [&str; 4] = [
    "Company Web Profile URL",
    "PublishedName",
    "Oldest Signing Date",
    "OldestBestPickText",
];

/// Write a dataset CSV with the default headers. Each row is
/// `(profile_url, name, signing_date, badge_text)`.
pub fn write_dataset_csv(path: &Path, rows: &[(&str, &str, &str, &str)]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create dataset csv: {}", path.display()))?;
    wtr.write_record(DATASET_HEADER)?;
    for (url, name, date, badge) in rows {
        wtr.write_record([*url, *name, *date, *badge])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_url_is_not_found() {
        let f = ScriptedFetcher::new();
        let err = f.fetch("https://www.example.com/x/y").await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
        assert_eq!(f.calls(), vec!["https://www.example.com/x/y".to_string()]);
    }

    #[test]
    fn roster_ranks_follow_input_order() {
        let c = category("plumbers/atlanta");
        let r = roster(&c, &[("Acme", "5 Years"), ("Bolt", "")]);
        assert_eq!(r[1].rank, 2);
        assert_eq!(r[0].category_id.as_str(), "https://www.example.com/plumbers/atlanta");
    }

    #[test]
    fn dataset_csv_has_default_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("d.csv");
        write_dataset_csv(&p, &[("https://e.com/a/b/c", "Acme", "2020-01-01", "1 Year")]).unwrap();
        let s = std::fs::read_to_string(&p).unwrap();
        assert!(s.starts_with(
            "Company Web Profile URL,PublishedName,Oldest Signing Date,OldestBestPickText\n"
        ));
    }
}
