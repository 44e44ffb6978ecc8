//! proof-roster
//!
//! Roster builder: turns the authoritative dataset into one ranked roster per
//! category page.
//!
//! This crate reads the dataset and ranks it. It does **not** fetch pages,
//! compare listings, or format reports.

pub mod builder;
pub mod category;
pub mod dates;
pub mod ingest;

pub use builder::{build_rosters, RosterSet};
pub use category::{category_id, DEFAULT_CATEGORY_DEPTH};
pub use dates::parse_sort_date;
pub use ingest::{
    load_dataset, parse_dataset_str, ColumnMap, Dataset, DatasetFormat, InputError, RawRow,
    SkipReason, SkippedRow,
};
