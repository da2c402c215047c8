use tracing::debug;

use crate::error::{EtlError, Result};
use crate::types::{ColumnMapping, DatasetSpec, RenamedTable, SourceTable};

/// Fail with a schema error naming every `required` column absent from `table`.
pub fn require_columns(table: &SourceTable, required: &[&str], label: &str) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EtlError::Schema {
            label: label.to_string(),
            missing,
            found: table.columns.clone(),
        })
    }
}

/// Select and rename the columns named by `spec`, producing canonical headers.
///
/// The key and required columns must exist. Optional columns that are absent
/// are left out of the result. The source table is not modified.
pub fn normalize(table: &SourceTable, spec: &DatasetSpec) -> Result<RenamedTable> {
    let required: Vec<&str> = std::iter::once(&spec.key)
        .chain(&spec.required)
        .map(|m| m.source.as_str())
        .collect();
    require_columns(table, &required, &spec.label)?;

    let mut picked: Vec<(usize, &ColumnMapping)> = Vec::new();
    for mapping in std::iter::once(&spec.key).chain(&spec.required) {
        if let Some(idx) = table.column_index(&mapping.source) {
            picked.push((idx, mapping));
        }
    }
    for mapping in &spec.optional {
        match table.column_index(&mapping.source) {
            Some(idx) => picked.push((idx, mapping)),
            None => debug!(
                dataset = %spec.label,
                column = %mapping.source,
                "optional column absent; omitting {}",
                mapping.canonical
            ),
        }
    }

    let columns = picked.iter().map(|(_, m)| m.canonical.clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            picked
                .iter()
                .map(|(idx, _)| Some(row[*idx].as_str()).filter(|s| !s.is_empty()).map(str::to_string))
                .collect()
        })
        .collect();

    Ok(RenamedTable {
        label: spec.label.clone(),
        columns,
        rows,
    })
}
