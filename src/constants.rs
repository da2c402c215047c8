/// Canonical column names shared by the merger, the output file and the loader.
/// Source files may use any names; the normalizer maps them onto these.

// Join key
pub const YEAR: &str = "Year";

// Rent dataset (anchor)
pub const AVG_RENT: &str = "Avg_Rent";
pub const VACANCY_RATE: &str = "Vacancy_Rate";

// Interest rate dataset
pub const INTEREST_RATE: &str = "Interest_Rate";
pub const MORTGAGE_RATE: &str = "Mortgage_Rate";

// Employment dataset
pub const EMPLOYMENT_RATE: &str = "Employment_Rate";
pub const UNEMPLOYMENT_RATE: &str = "Unemployment_Rate";

// Derived metrics
pub const RENT_YOY_PCT: &str = "Rent_YoY_Pct";
pub const EMPLOYMENT_YOY_PP: &str = "Employment_YoY_Pp";
pub const EMPLOYMENT_YOY_PCT: &str = "Employment_YoY_Pct";

// Dataset labels used in error messages and logs
pub const CMHC_LABEL: &str = "CMHC (rents)";
pub const BOC_LABEL: &str = "BoC (interest rates)";
pub const STATCAN_LABEL: &str = "StatCan (employment)";

/// Table the loader replaces on every run.
pub const MERGED_TABLE: &str = "merged_data";

// Conventional local layout
pub const DEFAULT_CMHC_PATH: &str = "data/cmhc_rental_ottawa.csv";
pub const DEFAULT_BOC_PATH: &str = "data/boc_interest_rates.csv";
pub const DEFAULT_STATCAN_PATH: &str = "data/statcan_employment_ottawa.csv";
pub const DEFAULT_OUT_PATH: &str = "data/merged_data.csv";
pub const DEFAULT_DB_PATH: &str = "data/ottawa_rental.sqlite";
pub const DEFAULT_SCHEMA_PATH: &str = "sql/schema.sql";
