// Merge pipeline: ingestion, processing, and storage of the merged dataset

pub mod ingestion;
pub mod processing;
pub mod storage;

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, info_span};

use crate::error::Result;
use crate::metrics::MergeMetrics;
use crate::types::{DatasetSpec, MergedTable, SourceTable};
use processing::{add_derived_metrics, coerce, join_on_year, key_by_year, normalize, KeyedTable};

/// One source file and how to read its columns.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub path: PathBuf,
    pub spec: DatasetSpec,
}

/// Everything a merge run needs. `rent` is the anchor dataset.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub rent: SourceInput,
    pub rate: SourceInput,
    pub employment: SourceInput,
    pub out: PathBuf,
}

/// Row accounting for one source dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub label: String,
    pub rows_read: usize,
    pub null_keys_dropped: usize,
    pub duplicate_keys: usize,
}

/// Result of a complete merge run
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output_file: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub datasets: Vec<DatasetStats>,
    pub sha256: String,
}

fn prepare(table: &SourceTable, spec: &DatasetSpec) -> Result<(KeyedTable, DatasetStats)> {
    let span = info_span!("dataset", label = %spec.label);
    let _enter = span.enter();

    let keyed = key_by_year(coerce(normalize(table, spec)?));
    let stats = DatasetStats {
        label: spec.label.clone(),
        rows_read: table.len(),
        null_keys_dropped: keyed.null_keys_dropped,
        duplicate_keys: keyed.duplicate_keys,
    };
    info!(
        rows = stats.rows_read,
        kept = keyed.rows.len(),
        fields = ?keyed.fields,
        "prepared dataset"
    );
    Ok((keyed, stats))
}

/// Normalize, coerce and join three in-memory source tables, then append the
/// derived metrics. Fails on the first dataset missing a required column.
pub fn merge_tables(
    rent: (&SourceTable, &DatasetSpec),
    rate: (&SourceTable, &DatasetSpec),
    employment: (&SourceTable, &DatasetSpec),
) -> Result<(MergedTable, Vec<DatasetStats>)> {
    let (rent, rent_stats) = prepare(rent.0, rent.1)?;
    let (rate, rate_stats) = prepare(rate.0, rate.1)?;
    let (employment, emp_stats) = prepare(employment.0, employment.1)?;

    let mut merged = join_on_year(&rent, &[rate, employment]);
    add_derived_metrics(&mut merged);

    Ok((merged, vec![rent_stats, rate_stats, emp_stats]))
}

/// Load the three source CSVs, merge them by year, compute the derived metrics
/// and write the merged CSV to `job.out`, replacing any previous file.
pub fn clean_and_merge(job: &MergeJob) -> Result<(MergedTable, MergeReport)> {
    let start = Instant::now();

    let mut tables = Vec::with_capacity(3);
    for input in [&job.rent, &job.rate, &job.employment] {
        let table = ingestion::read_source_csv(&input.path)?;
        info!(
            dataset = %input.spec.label,
            path = %input.path.display(),
            rows = table.len(),
            "loaded source"
        );
        MergeMetrics::record_rows_read(&input.spec.label, table.len());
        tables.push(table);
    }

    let (merged, datasets) = merge_tables(
        (&tables[0], &job.rent.spec),
        (&tables[1], &job.rate.spec),
        (&tables[2], &job.employment.spec),
    )?;

    let sha256 = storage::write_merged_csv(&merged, &job.out)?;
    let columns = merged.columns();
    MergeMetrics::record_output(merged.len(), columns.len());
    MergeMetrics::record_duration(start.elapsed().as_secs_f64());

    let report = MergeReport {
        output_file: job.out.clone(),
        rows: merged.len(),
        columns,
        datasets,
        sha256,
    };
    Ok((merged, report))
}
