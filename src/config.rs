use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{EtlError, Result};
use crate::pipeline::{MergeJob, SourceInput};
use crate::types::DatasetSpec;

/// File locations for both stages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub cmhc: PathBuf,
    pub boc: PathBuf,
    pub statcan: PathBuf,
    pub out: PathBuf,
    pub db: PathBuf,
    pub schema: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cmhc: DEFAULT_CMHC_PATH.into(),
            boc: DEFAULT_BOC_PATH.into(),
            statcan: DEFAULT_STATCAN_PATH.into(),
            out: DEFAULT_OUT_PATH.into(),
            db: DEFAULT_DB_PATH.into(),
            schema: DEFAULT_SCHEMA_PATH.into(),
        }
    }
}

/// Source column names of the rent dataset. An empty optional name disables it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CmhcColumns {
    pub year: String,
    pub rent: String,
    pub vacancy: String,
}

impl Default for CmhcColumns {
    fn default() -> Self {
        Self {
            year: YEAR.into(),
            rent: AVG_RENT.into(),
            vacancy: VACANCY_RATE.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BocColumns {
    pub year: String,
    pub rate: String,
    pub mortgage: String,
}

impl Default for BocColumns {
    fn default() -> Self {
        Self {
            year: YEAR.into(),
            rate: INTEREST_RATE.into(),
            mortgage: MORTGAGE_RATE.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatcanColumns {
    pub year: String,
    pub employment: String,
    pub unemployment: String,
}

impl Default for StatcanColumns {
    fn default() -> Self {
        Self {
            year: YEAR.into(),
            employment: EMPLOYMENT_RATE.into(),
            unemployment: UNEMPLOYMENT_RATE.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnsConfig {
    pub cmhc: CmhcColumns,
    pub boc: BocColumns,
    pub statcan: StatcanColumns,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub columns: ColumnsConfig,
}

impl Config {
    /// Defaults, overlaid with the TOML file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn rent_spec(&self) -> DatasetSpec {
        let c = &self.columns.cmhc;
        DatasetSpec::new(
            CMHC_LABEL,
            &c.year,
            &[(c.rent.as_str(), AVG_RENT)],
            &[(Some(c.vacancy.as_str()), VACANCY_RATE)],
        )
    }

    pub fn rate_spec(&self) -> DatasetSpec {
        let c = &self.columns.boc;
        DatasetSpec::new(
            BOC_LABEL,
            &c.year,
            &[(c.rate.as_str(), INTEREST_RATE)],
            &[(Some(c.mortgage.as_str()), MORTGAGE_RATE)],
        )
    }

    pub fn employment_spec(&self) -> DatasetSpec {
        let c = &self.columns.statcan;
        DatasetSpec::new(
            STATCAN_LABEL,
            &c.year,
            &[(c.employment.as_str(), EMPLOYMENT_RATE)],
            &[(Some(c.unemployment.as_str()), UNEMPLOYMENT_RATE)],
        )
    }

    pub fn merge_job(&self) -> MergeJob {
        MergeJob {
            rent: SourceInput {
                path: self.paths.cmhc.clone(),
                spec: self.rent_spec(),
            },
            rate: SourceInput {
                path: self.paths.boc.clone(),
                spec: self.rate_spec(),
            },
            employment: SourceInput {
                path: self.paths.statcan.clone(),
                spec: self.employment_spec(),
            },
            out: self.paths.out.clone(),
        }
    }
}
