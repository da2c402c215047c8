use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use crate::constants::YEAR;
use crate::error::{EtlError, Result};
use crate::metrics::LoadMetrics;
use crate::pipeline::ingestion::read_source_csv;
use crate::types::SourceTable;

/// SQLite storage class chosen for a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }

    /// Narrowest type that holds every non-empty cell. An all-empty column is `Real`.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        Self::infer_or(cells, SqlType::Real)
    }

    /// Like [`SqlType::infer`], with `empty` used when the column has no values.
    pub fn infer_or<'a>(cells: impl IntoIterator<Item = &'a str>, empty: SqlType) -> Self {
        let mut ty = SqlType::Integer;
        let mut any = false;
        for cell in cells.into_iter().filter(|c| !c.is_empty()) {
            any = true;
            if ty == SqlType::Integer && cell.parse::<i64>().is_err() {
                ty = SqlType::Real;
            }
            if ty == SqlType::Real && cell.parse::<f64>().is_err() {
                return SqlType::Text;
            }
        }
        if any {
            ty
        } else {
            empty
        }
    }

    fn value(self, cell: &str) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        match self {
            SqlType::Integer => cell.parse().map(Value::Integer).unwrap_or(Value::Null),
            SqlType::Real => cell.parse().map(Value::Real).unwrap_or(Value::Null),
            SqlType::Text => Value::Text(cell.to_string()),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Result of a completed load
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub db_path: PathBuf,
    pub table: String,
    pub rows: usize,
    pub schema_applied: bool,
}

/// Owns the SQLite connection for one load; the connection closes on drop.
pub struct SqliteLoader {
    conn: Connection,
}

impl SqliteLoader {
    /// Open (or create) the database file, creating its parent directory.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
        }
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Execute the whole DDL script at `schema_path` verbatim.
    /// Returns `false` without touching the store when the file does not exist.
    pub fn apply_schema(&self, schema_path: &Path) -> Result<bool> {
        if !schema_path.exists() {
            info!(path = %schema_path.display(), "schema script not found; skipping");
            return Ok(false);
        }
        let sql = fs::read_to_string(schema_path).map_err(|e| EtlError::io(schema_path, e))?;
        self.conn.execute_batch(&sql)?;
        info!(path = %schema_path.display(), "applied schema script");
        LoadMetrics::record_schema_applied();
        Ok(true)
    }

    /// Drop `table` if it exists, recreate it from the column types inferred from
    /// `data`, and insert every row, all in one transaction.
    pub fn replace_table(&mut self, table: &str, data: &SourceTable) -> Result<()> {
        if data.columns.is_empty() {
            return Err(EtlError::Data {
                origin: format!("table {table}"),
                message: "input has no columns".to_string(),
            });
        }

        // The year key stays INTEGER even when there are no rows to infer from
        let types: Vec<SqlType> = data
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let empty = if name == YEAR { SqlType::Integer } else { SqlType::Real };
                SqlType::infer_or(data.rows.iter().map(|r| r[i].as_str()), empty)
            })
            .collect();
        let column_defs: Vec<String> = data
            .columns
            .iter()
            .zip(&types)
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.as_sql()))
            .collect();
        let placeholders = vec!["?"; data.columns.len()].join(", ");
        let ident = quote_ident(table);
        debug!(table, columns = ?column_defs, "recreating table");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({});",
            column_defs.join(", ")
        ))?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
            for row in &data.rows {
                let values = row.iter().zip(&types).map(|(cell, ty)| ty.value(cell));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Load the delimited file at `csv_path` into `table` of the database at
/// `db_path`, replacing prior contents, after the optional schema script.
pub fn load_csv_into_sqlite(
    db_path: &Path,
    csv_path: &Path,
    schema_path: Option<&Path>,
    table: &str,
) -> Result<LoadReport> {
    let start = Instant::now();
    let data = read_source_csv(csv_path)?;

    let mut loader = SqliteLoader::open(db_path)?;
    let schema_applied = match schema_path {
        Some(path) => loader.apply_schema(path)?,
        None => false,
    };
    loader.replace_table(table, &data)?;
    let rows = loader.row_count(table)?;

    info!(db = %db_path.display(), table, rows, "loaded table");
    LoadMetrics::record_table_rows(rows);
    LoadMetrics::record_duration(start.elapsed().as_secs_f64());

    Ok(LoadReport {
        db_path: db_path.to_path_buf(),
        table: table.to_string(),
        rows,
        schema_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> SourceTable {
        SourceTable {
            columns: vec!["Year".into(), "Avg_Rent".into(), "Rent_YoY_Pct".into(), "Note".into()],
            rows: vec![
                vec!["2019".into(), "1000.0".into(), "".into(), "a".into()],
                vec!["2020".into(), "1100.0".into(), "10.0".into(), "".into()],
            ],
        }
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(SqlType::infer(["2019", "", "2020"]), SqlType::Integer);
        assert_eq!(SqlType::infer(["1", "2.5"]), SqlType::Real);
        assert_eq!(SqlType::infer(["1", "x", "2.5"]), SqlType::Text);
        assert_eq!(SqlType::infer(["", ""]), SqlType::Real);
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_replace_table_creates_typed_columns_and_nulls() -> anyhow::Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.replace_table("merged_data", &data())?;

        let conn = loader.connection();
        let (year, null_pct): (i64, Option<f64>) = conn.query_row(
            "SELECT Year, Rent_YoY_Pct FROM merged_data ORDER BY Year LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(year, 2019);
        assert_eq!(null_pct, None);

        let decl: String = conn.query_row(
            "SELECT type FROM pragma_table_info('merged_data') WHERE name = 'Year'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(decl, "INTEGER");
        Ok(())
    }

    #[test]
    fn test_replace_twice_does_not_duplicate_rows() -> anyhow::Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.replace_table("merged_data", &data())?;
        loader.replace_table("merged_data", &data())?;
        assert_eq!(loader.row_count("merged_data")?, 2);
        Ok(())
    }

    #[test]
    fn test_replace_discards_table_defined_by_schema() -> anyhow::Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader
            .connection()
            .execute_batch("CREATE TABLE merged_data (legacy TEXT); INSERT INTO merged_data VALUES ('x');")?;
        loader.replace_table("merged_data", &data())?;
        assert_eq!(loader.row_count("merged_data")?, 2);
        Ok(())
    }

    #[test]
    fn test_header_only_input_keeps_year_integer() -> anyhow::Result<()> {
        let header_only = SourceTable {
            columns: vec!["Year".into(), "Avg_Rent".into()],
            rows: vec![],
        };
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.replace_table("merged_data", &header_only)?;
        assert_eq!(loader.row_count("merged_data")?, 0);

        let types: Vec<(String, String)> = loader
            .connection()
            .prepare("SELECT name, type FROM pragma_table_info('merged_data') ORDER BY cid")?
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
        assert_eq!(
            types,
            vec![
                ("Year".to_string(), "INTEGER".to_string()),
                ("Avg_Rent".to_string(), "REAL".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_schema_script_is_skipped() -> anyhow::Result<()> {
        let loader = SqliteLoader::open_in_memory()?;
        assert!(!loader.apply_schema(Path::new("no/such/schema.sql"))?);
        Ok(())
    }
}
