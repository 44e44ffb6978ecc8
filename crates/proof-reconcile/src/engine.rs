use std::collections::{BTreeMap, BTreeSet};

use proof_schemas::{normalize_name, CategoryId, Observed, ObservedEntry, RosterEntry};

use crate::{CategoryReport, Diagnostic};

/// First occurrence of each normalized name, in the order given.
///
/// Later duplicates are dropped so that every comparison key maps to exactly
/// one entry on each side.
fn first_occurrences<'a, T>(
    items: impl Iterator<Item = &'a T>,
    name_of: impl Fn(&T) -> &str,
) -> Vec<(String, &'a T)>
where
    T: 'a,
{
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        let key = normalize_name(name_of(item));
        if seen.insert(key.clone()) {
            out.push((key, item));
        }
    }
    out
}

/// Expected badge must appear as a substring of the rendered one (both trimmed).
/// An empty expectation is always satisfied.
fn badge_satisfied(expected: &str, observed: &str) -> bool {
    observed.trim().contains(expected.trim())
}

/// Deterministic reconciliation of one roster against one observed listing.
///
/// Emission order:
/// 1. every `UnexpectedEntry`, in observed order
/// 2. every `MissingEntry`, in roster rank order
/// 3. per shared entry in roster rank order: `OrderMismatch`, then `BadgeMismatch`
///
/// Ranks and positions are renumbered 1..K over the shared names before they
/// are compared, so a single absent or extra entry does not shift everything
/// after it.
pub fn reconcile(roster: &[RosterEntry], observed: &Observed) -> Vec<Diagnostic> {
    let observed = match observed {
        Ok(entries) => entries,
        Err(failure) => {
            return vec![Diagnostic::FetchFailed {
                message: failure.message.clone(),
            }]
        }
    };

    let mut roster_sorted: Vec<&RosterEntry> = roster.iter().collect();
    roster_sorted.sort_by_key(|e| e.rank);
    let mut observed_sorted: Vec<&ObservedEntry> = observed.iter().collect();
    observed_sorted.sort_by_key(|o| o.position);

    let expected = first_occurrences(roster_sorted.into_iter(), |e| e.published_name.as_str());
    let seen = first_occurrences(observed_sorted.into_iter(), |o| o.raw_name.as_str());

    let expected_keys: BTreeSet<&str> = expected.iter().map(|(k, _)| k.as_str()).collect();
    let seen_keys: BTreeSet<&str> = seen.iter().map(|(k, _)| k.as_str()).collect();

    let mut diags: Vec<Diagnostic> = Vec::new();

    // 1) Set differences
    for (key, obs) in &seen {
        if !expected_keys.contains(key.as_str()) {
            diags.push(Diagnostic::UnexpectedEntry {
                name: obs.raw_name.trim().to_string(),
            });
        }
    }
    for (key, entry) in &expected {
        if !seen_keys.contains(key.as_str()) {
            diags.push(Diagnostic::MissingEntry {
                name: entry.published_name.trim().to_string(),
            });
        }
    }

    // 2) Order + badge over the intersection
    let shared_observed: BTreeMap<&str, (u32, &ObservedEntry)> = seen
        .iter()
        .filter(|(key, _)| expected_keys.contains(key.as_str()))
        .enumerate()
        .map(|(i, (key, obs))| (key.as_str(), (i as u32 + 1, *obs)))
        .collect();

    let shared_expected = expected
        .iter()
        .filter(|(key, _)| shared_observed.contains_key(key.as_str()));

    for (i, (key, entry)) in shared_expected.enumerate() {
        let expected_rank = i as u32 + 1;
        let Some(&(observed_position, obs)) = shared_observed.get(key.as_str()) else {
            continue;
        };
        let name = entry.published_name.trim().to_string();

        if expected_rank != observed_position {
            diags.push(Diagnostic::OrderMismatch {
                name: name.clone(),
                expected_rank,
                observed_position,
            });
        }

        if !badge_satisfied(&entry.expected_badge_text, &obs.raw_badge_text) {
            diags.push(Diagnostic::BadgeMismatch {
                name,
                expected: entry.expected_badge_text.trim().to_string(),
                observed: obs.raw_badge_text.trim().to_string(),
            });
        }
    }

    diags
}

/// [`reconcile`] wrapped with the category it belongs to.
pub fn reconcile_category(
    category_id: CategoryId,
    roster: &[RosterEntry],
    observed: &Observed,
) -> CategoryReport {
    CategoryReport::new(category_id, reconcile(roster, observed))
}
