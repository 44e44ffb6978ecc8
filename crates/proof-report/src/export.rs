use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::aggregate::ReportRow;

const HEADER: [&str; 2] = ["category_id", "errors"];

/// `proof_results_<YYYY-MM-DD>.csv`
pub fn default_output_name(date: NaiveDate) -> String {
    format!("proof_results_{}.csv", date.format("%Y-%m-%d"))
}

pub fn write_rows_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file: {}", path.display()))?;
    write_rows_csv_to(file, rows)
        .with_context(|| format!("failed to write report file: {}", path.display()))
}

/// Header is always written, even for an empty report.
pub fn write_rows_csv_to<W: Write>(w: W, rows: &[ReportRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record([row.category_id.as_str(), row.errors.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proof_schemas::CategoryId;

    #[test]
    fn dated_name() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(default_output_name(d), "proof_results_2024-03-07.csv");
    }

    #[test]
    fn empty_report_still_has_header() {
        let mut buf = Vec::new();
        write_rows_csv_to(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "category_id,errors\n");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        let mut buf = Vec::new();
        let rows = vec![ReportRow {
            category_id: CategoryId::new("https://e.com/a/b"),
            errors: "Wrong years: Acme, Inc. - Expected '5' but found '3'".to_string(),
        }];
        write_rows_csv_to(&mut buf, &rows).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.ends_with(
            "https://e.com/a/b,\"Wrong years: Acme, Inc. - Expected '5' but found '3'\"\n"
        ));
    }
}
