use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{error, info, warn};

use rental_etl::config::Config;
use rental_etl::constants::MERGED_TABLE;
use rental_etl::{clean_and_merge, load_csv_into_sqlite, logging, metrics, LoadReport, MergeReport};

#[derive(Parser)]
#[command(name = "rental_etl")]
#[command(about = "Clean and merge Ottawa rental + macro data by year, then load it into SQLite")]
#[command(version)]
struct Cli {
    /// TOML file with paths and column names; flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for JSON log files (daily rotation)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write a Prometheus text snapshot of run metrics to this file
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the rent, interest rate and employment CSVs by year
    Merge(MergeArgs),
    /// Load the merged CSV into SQLite, replacing the merged_data table
    Load(LoadArgs),
    /// Run merge then load
    Run {
        #[command(flatten)]
        merge: MergeArgs,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MergeArgs {
    #[arg(long)]
    cmhc: Option<PathBuf>,
    #[arg(long)]
    boc: Option<PathBuf>,
    #[arg(long)]
    statcan: Option<PathBuf>,
    #[arg(long)]
    out: Option<PathBuf>,

    // Column overrides
    #[arg(long)]
    cmhc_year_col: Option<String>,
    #[arg(long)]
    cmhc_rent_col: Option<String>,
    /// Optional column; pass "" to leave it out
    #[arg(long)]
    cmhc_vacancy_col: Option<String>,

    #[arg(long)]
    boc_year_col: Option<String>,
    #[arg(long)]
    boc_rate_col: Option<String>,
    /// Optional column; pass "" to leave it out
    #[arg(long)]
    boc_mortgage_col: Option<String>,

    #[arg(long)]
    statcan_year_col: Option<String>,
    #[arg(long)]
    statcan_emp_col: Option<String>,
    /// Optional column; pass "" to leave it out
    #[arg(long)]
    statcan_unemp_col: Option<String>,
}

#[derive(Args)]
struct LoadArgs {
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl MergeArgs {
    fn apply(self, config: &mut Config) {
        let paths = &mut config.paths;
        set(&mut paths.cmhc, self.cmhc);
        set(&mut paths.boc, self.boc);
        set(&mut paths.statcan, self.statcan);
        set(&mut paths.out, self.out);

        let cols = &mut config.columns;
        set(&mut cols.cmhc.year, self.cmhc_year_col);
        set(&mut cols.cmhc.rent, self.cmhc_rent_col);
        set(&mut cols.cmhc.vacancy, self.cmhc_vacancy_col);
        set(&mut cols.boc.year, self.boc_year_col);
        set(&mut cols.boc.rate, self.boc_rate_col);
        set(&mut cols.boc.mortgage, self.boc_mortgage_col);
        set(&mut cols.statcan.year, self.statcan_year_col);
        set(&mut cols.statcan.employment, self.statcan_emp_col);
        set(&mut cols.statcan.unemployment, self.statcan_unemp_col);
    }
}

/// What to run once the flags have been folded into the config
#[derive(Debug, PartialEq)]
enum Action {
    Merge,
    Load { csv: PathBuf },
    Run,
}

impl Commands {
    /// Overlay this command's flags on `config`, which already holds defaults
    /// and any TOML values.
    fn configure(self, config: &mut Config) -> Action {
        match self {
            Commands::Merge(args) => {
                args.apply(config);
                Action::Merge
            }
            Commands::Load(args) => {
                set(&mut config.paths.db, args.db);
                set(&mut config.paths.schema, args.schema);
                let csv = args.csv.unwrap_or_else(|| config.paths.out.clone());
                Action::Load { csv }
            }
            Commands::Run { merge, db, schema } => {
                merge.apply(config);
                set(&mut config.paths.db, db);
                set(&mut config.paths.schema, schema);
                Action::Run
            }
        }
    }
}

fn run_merge(config: &Config) -> Result<MergeReport> {
    let job = config.merge_job();
    let (_, report) = clean_and_merge(&job)?;

    for ds in &report.datasets {
        info!(
            dataset = %ds.label,
            rows = ds.rows_read,
            null_keys_dropped = ds.null_keys_dropped,
            duplicate_keys = ds.duplicate_keys,
            "dataset summary"
        );
    }
    println!(
        "Saved merged dataset: {} ({} rows)",
        report.output_file.display(),
        report.rows
    );
    println!("Columns: {}", report.columns.join(", "));
    Ok(report)
}

fn run_load(config: &Config, csv: &Path) -> Result<LoadReport> {
    let report = load_csv_into_sqlite(
        &config.paths.db,
        csv,
        Some(config.paths.schema.as_path()),
        MERGED_TABLE,
    )?;
    println!(
        "Loaded {} into {} with {} rows.",
        report.table,
        report.db_path.display(),
        report.rows
    );
    Ok(report)
}

fn execute(action: Action, config: &Config) -> Result<()> {
    match action {
        Action::Merge => run_merge(config).map(|_| ()),
        Action::Load { csv } => run_load(config, &csv).map(|_| ()),
        Action::Run => {
            let report = run_merge(config)?;
            run_load(config, &report.output_file).map(|_| ())
        }
    }
}

/// Write the metrics snapshot if one was requested, then hand back the run outcome.
/// A snapshot failure is only logged so it never hides the pipeline result.
fn finish(outcome: Result<()>, handle: Option<&PrometheusHandle>, path: Option<&Path>) -> Result<()> {
    if let (Some(handle), Some(path)) = (handle, path) {
        if let Err(e) = metrics::write_snapshot(handle, path) {
            warn!("failed to write metrics snapshot: {}", e);
        }
    }
    outcome
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.log_dir.as_deref())?;
    let metrics_handle = cli.metrics_file.as_ref().and_then(|_| metrics::init_metrics());

    let mut config = Config::load(cli.config.as_deref())?;
    let action = cli.command.configure(&mut config);

    let outcome = execute(action, &config);
    if let Err(e) = &outcome {
        error!("run failed: {:#}", e);
    }

    finish(outcome, metrics_handle.as_ref(), cli.metrics_file.as_deref())
}
