use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Years outside this window are treated as mis-parses (e.g. `3/15/21`
/// read with a four-digit year pattern).
fn plausible(ts: NaiveDateTime) -> Option<NaiveDateTime> {
    use chrono::Datelike;
    (1900..=2199).contains(&ts.year()).then_some(ts)
}

/// Parse a signing timestamp. Date-only values sit at midnight; offsets are
/// normalized to UTC. `None` means not-a-date: the entry is kept and ranked
/// after every dated entry.
///
/// The time of day is kept so two signings on the same day rank by time.
pub fn parse_sort_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return plausible(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Some(ts) = NaiveDateTime::parse_from_str(s, fmt).ok().and_then(plausible) {
            return Some(ts);
        }
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find_map(|d| plausible(d.and_time(NaiveTime::MIN)))
}
