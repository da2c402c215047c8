pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use error::{EtlError, Result};
pub use loader::{load_csv_into_sqlite, LoadReport, SqliteLoader};
pub use pipeline::{clean_and_merge, merge_tables, MergeJob, MergeReport, SourceInput};
pub use types::{DatasetSpec, MergedTable, SourceTable};
