use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use crate::types::{CanonicalRow, CanonicalTable, RenamedTable};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").expect("valid regex"))
}

fn month_name_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)\.?[\s-]+(\d{4})$").expect("valid regex"))
}

/// Interpret a raw key cell as a year.
///
/// Integer literals (and floats with no fractional part, e.g. `2019.0`) are
/// taken as-is; anything else is parsed as a date and its year extracted.
/// Returns `None` when no interpretation applies.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(n) = s.parse::<i64>() {
        return i32::try_from(n).ok();
    }
    if let Ok(f) = s.parse::<f64>() {
        let in_range = f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64;
        return in_range.then_some(f as i32);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.year());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.year());
        }
    }

    if let Some(caps) = year_month_re().captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.year());
    }
    if let Some(caps) = month_name_year_re().captures(s) {
        // %B also accepts the abbreviated month name when parsing
        let probe = format!("1 {} {}", &caps[1], &caps[2]);
        return NaiveDate::parse_from_str(&probe, "%d %B %Y").ok().map(|d| d.year());
    }

    None
}

/// Interpret a raw cell as a finite number; anything else is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a renamed table: the first column becomes an integer year, every
/// other column a nullable float. Cells that fail to parse become `None`.
pub fn coerce(table: RenamedTable) -> CanonicalTable {
    let fields: Vec<String> = table.columns.iter().skip(1).cloned().collect();
    let mut unparsed_keys = 0usize;
    let mut unparsed_values = 0usize;

    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let key = cells.next().flatten();
            let year = key.as_deref().and_then(parse_year);
            if year.is_none() {
                unparsed_keys += 1;
            }
            let values = cells
                .map(|cell| {
                    let v = cell.as_deref().and_then(parse_number);
                    if cell.is_some() && v.is_none() {
                        unparsed_values += 1;
                    }
                    v
                })
                .collect();
            CanonicalRow { year, values }
        })
        .collect();

    if unparsed_keys > 0 || unparsed_values > 0 {
        debug!(
            dataset = %table.label,
            unparsed_keys,
            unparsed_values,
            "coerced unparseable cells to null"
        );
    }

    CanonicalTable {
        label: table.label,
        fields,
        rows,
    }
}
