use std::fs;
use std::path::Path;

use anyhow::Result;
use rental_etl::config::Config;
use rental_etl::constants::*;
use rental_etl::pipeline::storage::read_merged_csv;
use rental_etl::{clean_and_merge, EtlError, MergeJob};
use tempfile::{tempdir, TempDir};

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Lay out three source files in a temp dir and build a job with default columns.
fn job(rent: &str, rate: &str, emp: &str) -> (TempDir, MergeJob) {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.paths.cmhc = write(dir.path(), "cmhc.csv", rent);
    config.paths.boc = write(dir.path(), "boc.csv", rate);
    config.paths.statcan = write(dir.path(), "statcan.csv", emp);
    config.paths.out = dir.path().join("out/merged_data.csv");
    let job = config.merge_job();
    (dir, job)
}

const RENT: &str = "Year,Avg_Rent,Vacancy_Rate\n2021,990,3.4\n2019,1000,1.8\n2020,1100,3.9\n";
const RATE: &str = "Year,Interest_Rate,Mortgage_Rate\n2019,1.75,5.34\n2021,0.25,4.79\n";
const EMP: &str = "Year,Employment_Rate,Unemployment_Rate\n2020,58.0,8.9\n2021,60.9,6.9\n";

#[test]
fn test_join_keeps_every_rent_year_and_fills_gaps_with_null() -> Result<()> {
    let (_dir, job) = job(RENT, RATE, EMP);
    let (merged, report) = clean_and_merge(&job)?;

    assert_eq!(merged.years(), vec![2019, 2020, 2021]);
    assert_eq!(report.rows, 3);
    assert_eq!(merged.field(INTEREST_RATE).unwrap()[1], None);
    assert_eq!(merged.field(EMPLOYMENT_RATE).unwrap()[0], None);
    assert_eq!(merged.field(EMPLOYMENT_RATE).unwrap()[2], Some(60.9));
    Ok(())
}

#[test]
fn test_output_columns_are_key_sources_then_derived() -> Result<()> {
    let (_dir, job) = job(RENT, RATE, EMP);
    let (_, report) = clean_and_merge(&job)?;
    assert_eq!(
        report.columns,
        vec![
            YEAR,
            AVG_RENT,
            VACANCY_RATE,
            INTEREST_RATE,
            MORTGAGE_RATE,
            EMPLOYMENT_RATE,
            UNEMPLOYMENT_RATE,
            RENT_YOY_PCT,
            EMPLOYMENT_YOY_PP,
            EMPLOYMENT_YOY_PCT,
        ]
    );
    Ok(())
}

#[test]
fn test_rent_percent_change() -> Result<()> {
    let (_dir, job) = job(RENT, RATE, EMP);
    let (merged, _) = clean_and_merge(&job)?;
    let pct = merged.field(RENT_YOY_PCT).unwrap();
    assert_eq!(pct[0], None);
    assert!((pct[1].unwrap() - 10.0).abs() < 1e-9);
    assert!((pct[2].unwrap() + 10.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_missing_required_column_fails_for_each_dataset() {
    let cases = [
        ("Year,Rent\n2019,1000\n", RATE, EMP, CMHC_LABEL, AVG_RENT),
        (RENT, "Yr,Interest_Rate\n2019,1.75\n", EMP, BOC_LABEL, YEAR),
        (RENT, RATE, "Year,Jobs\n2019,60\n", STATCAN_LABEL, EMPLOYMENT_RATE),
    ];
    for (rent, rate, emp, label, column) in cases {
        let (_dir, job) = job(rent, rate, emp);
        match clean_and_merge(&job) {
            Err(EtlError::Schema { label: l, missing, .. }) => {
                assert_eq!(l, label);
                assert_eq!(missing, vec![column.to_string()]);
            }
            other => panic!("expected schema error for {label}, got {other:?}"),
        }
    }
}

#[test]
fn test_missing_optional_rate_column_is_omitted() -> Result<()> {
    let (_dir, job) = job(RENT, "Year,Interest_Rate\n2019,1.75\n", EMP);
    let (merged, report) = clean_and_merge(&job)?;
    assert!(!merged.has_field(MORTGAGE_RATE));
    assert!(!report.columns.iter().any(|c| c == MORTGAGE_RATE));
    assert!(merged.has_field(INTEREST_RATE));
    Ok(())
}

#[test]
fn test_written_file_round_trips() -> Result<()> {
    let (_dir, job) = job(RENT, RATE, EMP);
    let (merged, _) = clean_and_merge(&job)?;

    let back = read_merged_csv(&job.out)?;
    assert_eq!(back.columns(), merged.columns());
    assert_eq!(back.years(), merged.years());
    for (a, b) in back.rows.iter().zip(&merged.rows) {
        for (x, y) in a.values.iter().zip(&b.values) {
            match (x, y) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9),
                (None, None) => {}
                _ => panic!("null mismatch in year {}", a.year),
            }
        }
    }
    Ok(())
}

#[test]
fn test_rerun_produces_byte_identical_output() -> Result<()> {
    let (_dir, job) = job(RENT, RATE, EMP);
    let (_, first) = clean_and_merge(&job)?;
    let first_bytes = fs::read(&job.out)?;
    let (_, second) = clean_and_merge(&job)?;
    let second_bytes = fs::read(&job.out)?;

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.sha256, second.sha256);
    Ok(())
}

#[test]
fn test_unparseable_years_are_dropped_and_counted() -> Result<()> {
    let rent = "Year,Avg_Rent\n2019-01-01,1000\nunknown,5\n2020-01-01,1100\n";
    let (_dir, job) = job(rent, RATE, EMP);
    let (merged, report) = clean_and_merge(&job)?;

    assert_eq!(merged.years(), vec![2019, 2020]);
    assert_eq!(report.datasets[0].rows_read, 3);
    assert_eq!(report.datasets[0].null_keys_dropped, 1);
    Ok(())
}

#[test]
fn test_duplicate_years_in_rate_do_not_multiply_rows() -> Result<()> {
    let rate = "Year,Interest_Rate\n2019,1.75\n2019,9.99\n2020,0.25\n";
    let (_dir, job) = job(RENT, rate, EMP);
    let (merged, report) = clean_and_merge(&job)?;

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.field(INTEREST_RATE).unwrap()[0], Some(1.75));
    assert_eq!(report.datasets[1].duplicate_keys, 1);
    Ok(())
}

#[test]
fn test_non_numeric_values_become_empty_cells() -> Result<()> {
    let rent = "Year,Avg_Rent\n2019,1000\n2020,n/a\n2021,990\n";
    let (_dir, job) = job(rent, RATE, EMP);
    clean_and_merge(&job)?;

    let text = fs::read_to_string(&job.out)?;
    let row_2020 = text.lines().find(|l| l.starts_with("2020,")).unwrap();
    assert!(row_2020.starts_with("2020,,"));
    Ok(())
}

#[test]
fn test_missing_source_file_is_io_error() {
    let (dir, mut job) = job(RENT, RATE, EMP);
    job.rate.path = dir.path().join("absent.csv");
    assert!(matches!(clean_and_merge(&job), Err(EtlError::Io { .. })));
}
