// Pipeline ingestion: reading delimited source files into memory

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, instrument};

use crate::error::{EtlError, Result};
use crate::types::SourceTable;

/// Read a headed CSV file fully into memory.
///
/// Cells are trimmed. Short records are padded with empty cells and long ones
/// truncated so every row matches the header width.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_source_csv<P: AsRef<Path>>(path: P) -> Result<SourceTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
    read_source_from(file, path)
}

/// Same as [`read_source_csv`] over any reader; `origin` is used in error messages.
pub fn read_source_from<R: Read>(reader: R, origin: &Path) -> Result<SourceTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| EtlError::csv(origin, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let width = columns.len();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| EtlError::csv(origin, e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    debug!(columns = width, rows = rows.len(), "read source table");
    Ok(SourceTable { columns, rows })
}
