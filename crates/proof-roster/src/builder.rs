//! Roster construction: group by category, stable-sort by signing date,
//! assign ranks.

use std::collections::{BTreeMap, BTreeSet};

use proof_schemas::{normalize_name, CategoryId, RosterEntry};
use tracing::{debug, warn};

use crate::category::category_id;
use crate::dates::parse_sort_date;
use crate::ingest::{Dataset, SkipReason, SkippedRow};

/// Ranked rosters for every category with at least one usable row.
#[derive(Debug, Clone, Default)]
pub struct RosterSet {
    /// Category → entries in rank order (rank 1 first).
    pub rosters: BTreeMap<CategoryId, Vec<RosterEntry>>,
    /// Rows excluded during decoding or category derivation, by row number.
    pub skipped: Vec<SkippedRow>,
    /// Rows seen in the dataset, usable or not.
    pub rows_read: usize,
    /// Entries whose signing date was not a date (ranked last).
    pub undated_entries: usize,
    /// `(category, name)` pairs where the normalized name appears more than
    /// once in one roster.
    pub duplicate_names: Vec<(CategoryId, String)>,
}

impl RosterSet {
    pub fn category_count(&self) -> usize {
        self.rosters.len()
    }

    pub fn entry_count(&self) -> usize {
        self.rosters.values().map(Vec::len).sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.skipped.len()
    }

    pub fn get(&self, category: &CategoryId) -> Option<&[RosterEntry]> {
        self.rosters.get(category).map(Vec::as_slice)
    }
}

/// Build ranked rosters from a decoded dataset.
///
/// Within a category, entries are sorted ascending by signing date with
/// undated entries last; ties keep dataset order (stable sort). Ranks are
/// then `1..=N`. Rows whose profile URL yields no category are skipped.
pub fn build_rosters(dataset: &Dataset, depth: usize) -> RosterSet {
    let mut set = RosterSet {
        skipped: dataset.skipped.clone(),
        rows_read: dataset.rows_read(),
        ..RosterSet::default()
    };

    let mut grouped: BTreeMap<CategoryId, Vec<RosterEntry>> = BTreeMap::new();

    for row in &dataset.rows {
        let Some(category) = category_id(&row.profile_url, depth) else {
            warn!(row = row.row, url = %row.profile_url, "skipping row: no category prefix");
            set.skipped.push(SkippedRow {
                row: row.row,
                reason: SkipReason::BadUrl(row.profile_url.clone()),
            });
            continue;
        };

        let sort_key = parse_sort_date(&row.sort_date);
        if sort_key.is_none() {
            set.undated_entries += 1;
            debug!(row = row.row, raw = %row.sort_date, "signing date is not a date; ranked last");
        }

        grouped.entry(category.clone()).or_default().push(RosterEntry {
            category_id: category,
            published_name: row.name.clone(),
            expected_badge_text: row.badge_text.clone(),
            sort_key,
            rank: 0,
            source_row: row.row,
        });
    }

    set.skipped.sort_by_key(|s| s.row);

    for (category, mut entries) in grouped {
        // Vec::sort_by_key is stable: equal keys keep dataset order.
        entries.sort_by_key(|e| (e.sort_key.is_none(), e.sort_key));
        for (i, e) in entries.iter_mut().enumerate() {
            e.rank = i as u32 + 1;
        }

        let mut seen: BTreeSet<String> = BTreeSet::new();
        for e in &entries {
            let key = normalize_name(&e.published_name);
            if !seen.insert(key) {
                warn!(category = %category, name = %e.published_name, "duplicate name in roster");
                set.duplicate_names
                    .push((category.clone(), e.published_name.clone()));
            }
        }

        set.rosters.insert(category, entries);
    }

    set
}
