use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use proof_roster::{build_rosters, load_dataset, RosterSet};

use super::{column_map, load_config};

/// Build rosters from the dataset without fetching anything.
pub fn build(input: &Path, config_paths: &[String], strict: bool) -> Result<RosterSet> {
    let (_, settings) = load_config(config_paths, strict)?;
    let dataset = load_dataset(input, &column_map(&settings.input.columns))
        .with_context(|| format!("failed to load dataset: {}", input.display()))?;
    Ok(build_rosters(&dataset, settings.input.category_depth))
}

pub fn print(set: &RosterSet) {
    for (category, entries) in &set.rosters {
        println!("category={} entries={}", category, entries.len());
        for e in entries {
            let date = e.sort_key.map_or_else(|| "none".to_string(), |ts| {
                if ts.time() == NaiveTime::MIN {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            });
            println!(
                "  rank={} name={:?} badge={:?} date={} row={}",
                e.rank, e.published_name, e.expected_badge_text, date, e.source_row
            );
        }
    }
    for s in &set.skipped {
        println!("skipped row={} reason={:?}", s.row, s.reason.to_string());
    }
    println!("rows_read={}", set.rows_read);
    println!("rows_skipped={}", set.rows_skipped());
    println!("categories={}", set.category_count());
    println!("entries={}", set.entry_count());
    println!("undated_entries={}", set.undated_entries);
    println!("duplicate_names={}", set.duplicate_names.len());
}
