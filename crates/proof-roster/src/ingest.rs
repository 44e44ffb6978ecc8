//! Dataset ingestion for the expected-entry spreadsheet.
//!
//! Reads the dataset workbook (first worksheet of an `.xlsx`/`.xls`/`.ods`
//! file) or a CSV/TSV export of it into [`RawRow`] values. Every format goes
//! through the same header matching and row checks. This is the **read** side only: no ranking and no
//! category derivation happen here.
//!
//! ## Column contract (trimmed, case-insensitive, order-independent)
//!
//! | Role          | Default header              | Notes                        |
//! |---------------|-----------------------------|------------------------------|
//! | profile URL   | `Company Web Profile URL`   | Category derived from prefix |
//! | name          | `PublishedName`             | Display name                 |
//! | sort date     | `Oldest Signing Date`       | May be empty / unparsable    |
//! | badge text    | `OldestBestPickText`        | May be empty                 |
//!
//! A missing header column is fatal. A bad row is skipped and recorded.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use calamine::{Data, Reader};

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names for the four required dataset columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub profile_url: String,
    pub name: String,
    pub sort_date: String,
    pub badge_text: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            profile_url: "Company Web Profile URL".to_string(),
            name: "PublishedName".to_string(),
            sort_date: "Oldest Signing Date".to_string(),
            badge_text: "OldestBestPickText".to_string(),
        }
    }
}

impl ColumnMap {
    fn required(&self) -> [&str; 4] {
        [
            self.profile_url.as_str(),
            self.name.as_str(),
            self.sort_date.as_str(),
            self.badge_text.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that stop ingestion before any processing.
#[derive(Debug)]
pub enum InputError {
    /// The file could not be opened or read.
    Io(String),
    /// The header row lacks one or more required columns (all are named).
    MissingColumns(Vec<String>),
    /// The header row itself could not be decoded.
    Header(String),
    /// The workbook opened but its first worksheet could not be read.
    Workbook(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Io(msg) => write!(f, "input io error: {msg}"),
            InputError::MissingColumns(cols) => {
                let quoted: Vec<String> = cols.iter().map(|c| format!("'{c}'")).collect();
                write!(
                    f,
                    "input missing required column(s): {}",
                    quoted.join(", ")
                )
            }
            InputError::Header(msg) => write!(f, "input header unreadable: {msg}"),
            InputError::Workbook(msg) => write!(f, "input worksheet unreadable: {msg}"),
        }
    }
}

impl std::error::Error for InputError {}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One dataset row with the required fields extracted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data-row index (header excluded).
    pub row: usize,
    pub profile_url: String,
    pub name: String,
    pub sort_date: String,
    pub badge_text: String,
}

/// Why a row was excluded from the rosters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The record could not be decoded (bad UTF-8, broken quoting).
    Undecodable(String),
    /// A field that must be non-empty was blank.
    EmptyField(&'static str),
    /// The profile URL has too few segments to name a category.
    BadUrl(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Undecodable(msg) => write!(f, "undecodable record: {msg}"),
            SkipReason::EmptyField(field) => write!(f, "empty {field}"),
            SkipReason::BadUrl(url) => write!(f, "profile url has no category prefix: '{url}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Decoded dataset: usable rows plus the rows skipped during decoding.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<RawRow>,
    pub skipped: Vec<SkippedRow>,
}

impl Dataset {
    /// Rows seen in the file, usable or not.
    pub fn rows_read(&self) -> usize {
        self.rows.len() + self.skipped.len()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// File formats [`load_dataset`] accepts, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Delimited text with the given field separator.
    Delimited(u8),
    /// Spreadsheet workbook (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`);
    /// the first worksheet is read.
    Workbook,
}

impl DatasetFormat {
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => DatasetFormat::Workbook,
            "tsv" => DatasetFormat::Delimited(b'\t'),
            _ => DatasetFormat::Delimited(b','),
        }
    }
}

/// Load the dataset at `path` in the format its extension names.
pub fn load_dataset(path: &Path, columns: &ColumnMap) -> Result<Dataset, InputError> {
    match DatasetFormat::for_path(path) {
        DatasetFormat::Workbook => load_workbook(path, columns),
        DatasetFormat::Delimited(delimiter) => {
            let file = std::fs::File::open(path)
                .map_err(|e| InputError::Io(format!("open '{}': {e}", path.display())))?;
            parse_reader(file, delimiter, columns)
        }
    }
}

/// Parse a dataset from a string slice (tests, piped input).
pub fn parse_dataset_str(
    src: &str,
    delimiter: u8,
    columns: &ColumnMap,
) -> Result<Dataset, InputError> {
    parse_reader(src.as_bytes(), delimiter, columns)
}

fn parse_reader<R: Read>(
    reader: R,
    delimiter: u8,
    columns: &ColumnMap,
) -> Result<Dataset, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| InputError::Header(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let records = rdr.into_records().map(|rec| {
        rec.map(|r| r.iter().map(str::to_string).collect())
            .map_err(|e| e.to_string())
    });
    rows_from_records(&headers, records, columns)
}

fn load_workbook(path: &Path, columns: &ColumnMap) -> Result<Dataset, InputError> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| InputError::Io(format!("open '{}': {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InputError::Workbook(format!("'{}' has no worksheets", path.display())))?
        .map_err(|e| InputError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    // An empty sheet has no header row and fails the column check below.
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();

    let records = rows.map(|r| Ok(r.iter().map(cell_text).collect()));
    rows_from_records(&headers, records, columns)
}

/// Text of a worksheet cell as a CSV export would show it. Date cells
/// become `YYYY-MM-DD HH:MM:SS`; error cells are blank.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
    }
}

/// Shared by every format: match `headers` against `columns`, then turn each
/// record into a [`RawRow`] or a [`SkippedRow`].
fn rows_from_records<I>(
    headers: &[String],
    records: I,
    columns: &ColumnMap,
) -> Result<Dataset, InputError>
where
    I: Iterator<Item = Result<Vec<String>, String>>,
{
    let col_idx = build_col_index(headers.iter().map(String::as_str));
    let missing: Vec<String> = columns
        .required()
        .iter()
        .filter(|c| !col_idx.contains_key(&header_key(c)))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(InputError::MissingColumns(missing));
    }

    let idx = |name: &str| col_idx[&header_key(name)];
    let (i_url, i_name, i_date, i_badge) = (
        idx(&columns.profile_url),
        idx(&columns.name),
        idx(&columns.sort_date),
        idx(&columns.badge_text),
    );

    let mut out = Dataset::default();

    for (i, rec) in records.enumerate() {
        let row = i + 1;
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                skip(&mut out.skipped, row, SkipReason::Undecodable(e));
                continue;
            }
        };

        // Blank lines come through as a single empty field.
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let field = |i: usize| rec.get(i).map(|f| f.trim()).unwrap_or("").to_string();
        let profile_url = field(i_url);
        let name = field(i_name);

        if profile_url.is_empty() {
            skip(&mut out.skipped, row, SkipReason::EmptyField("profile_url"));
            continue;
        }
        if name.is_empty() {
            skip(&mut out.skipped, row, SkipReason::EmptyField("name"));
            continue;
        }

        out.rows.push(RawRow {
            row,
            profile_url,
            name,
            sort_date: field(i_date),
            badge_text: field(i_badge),
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn skip(skipped: &mut Vec<SkippedRow>, row: usize, reason: SkipReason) {
    tracing::warn!(row, reason = %reason, "dataset row skipped");
    skipped.push(SkippedRow { row, reason });
}

fn header_key(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Case-insensitive header → index map. First occurrence wins on duplicates.
fn build_col_index<'a>(headers: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut idx: HashMap<String, usize> = HashMap::new();
    for (i, h) in headers.enumerate() {
        idx.entry(header_key(h)).or_insert(i);
    }
    idx
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
