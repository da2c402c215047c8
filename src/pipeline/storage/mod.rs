// Pipeline storage: the merged table as a delimited file

use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::constants::YEAR;
use crate::error::{EtlError, Result};
use crate::pipeline::ingestion::read_source_csv;
use crate::pipeline::processing::coerce::parse_number;
use crate::types::{MergedRow, MergedTable};

/// Format a float the way it is written to disk: shortest round-trip form,
/// always with a decimal point or exponent (`1000.0`, `-10.0`, `1e-7`).
pub fn format_number(v: f64) -> String {
    format!("{v:?}")
}

/// Serialize `table` as CSV bytes: header row, then one row per year, nulls as empty cells.
pub fn encode_merged(table: &MergedTable) -> csv::Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(table.columns())?;
    for row in &table.rows {
        let record = std::iter::once(row.year.to_string()).chain(
            row.values
                .iter()
                .copied()
                .map(|v| v.map(format_number).unwrap_or_default()),
        );
        wtr.write_record(record)?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Write `table` to `path`, creating parent directories and replacing any
/// existing file. Returns the hex SHA-256 of the bytes written.
pub fn write_merged_csv(table: &MergedTable, path: &Path) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    }
    let bytes = encode_merged(table).map_err(|e| EtlError::csv(path, e))?;
    fs::write(path, &bytes).map_err(|e| EtlError::io(path, e))?;

    let digest = hex::encode(Sha256::digest(&bytes));
    info!(path = %path.display(), rows = table.len(), sha256 = %digest, "wrote merged dataset");
    Ok(digest)
}

/// Read a merged CSV back into a typed table. The first column must be `Year`.
pub fn read_merged_csv(path: &Path) -> Result<MergedTable> {
    let source = read_source_csv(path)?;
    if source.columns.first().map(String::as_str) != Some(YEAR) {
        return Err(EtlError::Schema {
            label: path.display().to_string(),
            missing: vec![YEAR.to_string()],
            found: source.columns,
        });
    }

    let mut rows = Vec::with_capacity(source.len());
    for (line, cells) in source.rows.iter().enumerate() {
        let year = cells[0].parse::<i32>().map_err(|e| EtlError::Data {
            origin: path.display().to_string(),
            message: format!("row {} has invalid year {:?}: {e}", line + 1, cells[0]),
        })?;
        let values = cells[1..].iter().map(|c| parse_number(c)).collect();
        rows.push(MergedRow { year, values });
    }
    debug!(path = %path.display(), rows = rows.len(), "read merged dataset");

    Ok(MergedTable {
        fields: source.columns[1..].to_vec(),
        rows,
    })
}
