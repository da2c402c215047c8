use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::metrics::MergeMetrics;
use crate::types::{CanonicalTable, MergedRow, MergedTable};

/// A canonical table with a non-null, unique year on every row.
#[derive(Debug, Clone)]
pub struct KeyedTable {
    pub label: String,
    pub fields: Vec<String>,
    pub rows: Vec<(i32, Vec<Option<f64>>)>,
    /// Rows removed because the year could not be parsed
    pub null_keys_dropped: usize,
    /// Rows removed because an earlier row had the same year
    pub duplicate_keys: usize,
}

/// Drop rows with a null year, then keep only the first row for each year.
pub fn key_by_year(table: CanonicalTable) -> KeyedTable {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut null_keys_dropped = 0;
    let mut duplicate_keys = 0;

    for row in table.rows {
        match row.year {
            None => null_keys_dropped += 1,
            Some(year) if !seen.insert(year) => duplicate_keys += 1,
            Some(year) => rows.push((year, row.values)),
        }
    }

    if null_keys_dropped > 0 {
        warn!(
            dataset = %table.label,
            rows = null_keys_dropped,
            "dropped rows whose year could not be parsed"
        );
        MergeMetrics::record_null_keys_dropped(&table.label, null_keys_dropped);
    }
    if duplicate_keys > 0 {
        warn!(
            dataset = %table.label,
            rows = duplicate_keys,
            "ignored rows repeating an earlier year; first occurrence kept"
        );
        MergeMetrics::record_duplicate_keys(&table.label, duplicate_keys);
    }

    KeyedTable {
        label: table.label,
        fields: table.fields,
        rows,
        null_keys_dropped,
        duplicate_keys,
    }
}

/// Start a merged table from the anchor dataset.
pub fn anchor(table: &KeyedTable) -> MergedTable {
    MergedTable {
        fields: table.fields.clone(),
        rows: table
            .rows
            .iter()
            .map(|(year, values)| MergedRow {
                year: *year,
                values: values.clone(),
            })
            .collect(),
    }
}

/// Left-preserving join on year: every row of `left` is kept, and gains the
/// columns of `right` from the matching row or nulls when there is none.
/// Rows of `right` without a match in `left` are discarded.
pub fn left_join(mut left: MergedTable, right: &KeyedTable) -> MergedTable {
    let lookup: HashMap<i32, &Vec<Option<f64>>> = right
        .rows
        .iter()
        .map(|(year, values)| (*year, values))
        .collect();
    let width = right.fields.len();

    for row in &mut left.rows {
        match lookup.get(&row.year) {
            Some(values) => row.values.extend(values.iter().copied()),
            None => row.values.extend(std::iter::repeat(None).take(width)),
        }
    }
    left.fields.extend(right.fields.iter().cloned());
    left
}

/// Join the anchor with each other table in turn, then sort ascending by year.
pub fn join_on_year(anchor_table: &KeyedTable, others: &[KeyedTable]) -> MergedTable {
    let mut merged = others
        .iter()
        .fold(anchor(anchor_table), |acc, right| left_join(acc, right));
    merged.rows.sort_by_key(|r| r.year);
    merged
}
