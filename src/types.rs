use crate::constants;

/// A delimited source file as read: header names plus raw cells, row order preserved.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub columns: Vec<String>,
    /// One entry per data record; every row has exactly `columns.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Maps one source column onto a canonical column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: String,
    pub canonical: String,
}

impl ColumnMapping {
    pub fn new(source: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            canonical: canonical.into(),
        }
    }
}

/// How one source dataset is turned into canonical columns.
///
/// `key` and `required` must exist in the source; `optional` columns are taken
/// only when present. Output columns keep this order: key, required, optional.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub label: String,
    pub key: ColumnMapping,
    pub required: Vec<ColumnMapping>,
    pub optional: Vec<ColumnMapping>,
}

impl DatasetSpec {
    /// Build a spec whose join key maps onto `Year`. Optional sources that are
    /// `None` or blank are left out entirely.
    pub fn new(
        label: impl Into<String>,
        year_col: &str,
        required: &[(&str, &str)],
        optional: &[(Option<&str>, &str)],
    ) -> Self {
        Self {
            label: label.into(),
            key: ColumnMapping::new(year_col, constants::YEAR),
            required: required
                .iter()
                .map(|(src, canon)| ColumnMapping::new(*src, *canon))
                .collect(),
            optional: optional
                .iter()
                .filter_map(|(src, canon)| {
                    (*src)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| ColumnMapping::new(s, *canon))
                })
                .collect(),
        }
    }
}

/// A source table after renaming: canonical headers, raw cells, `Year` first.
#[derive(Debug, Clone)]
pub struct RenamedTable {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// One row after type coercion. `year` is `None` when the key could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub year: Option<i32>,
    pub values: Vec<Option<f64>>,
}

/// A dataset in canonical form: `fields` names the non-key columns of every row.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    pub label: String,
    pub fields: Vec<String>,
    pub rows: Vec<CanonicalRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub year: i32,
    pub values: Vec<Option<f64>>,
}

/// The joined table, one row per distinct year, sorted ascending.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    /// Non-key column names in output order; `Year` is implied first.
    pub fields: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Full header, key first.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(constants::YEAR.to_string())
            .chain(self.fields.iter().cloned())
            .collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Values of one non-key column in row order.
    pub fn field(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.fields.iter().position(|f| f == name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    /// Append a computed column. `values` must have one entry per row.
    pub fn push_field(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.fields.push(name.into());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.values.push(v);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
