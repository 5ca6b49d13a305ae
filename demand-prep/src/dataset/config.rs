//! Dataset build configuration.
//!
//! Loaded from TOML; every field except the date boundaries has a default.
//!
//! ```toml
//! state = "SP"
//! start_date = "2017-01-01"
//! end_date = "2018-08-31"
//! product_categories = ["bed_bath_table", "health_beauty"]
//!
//! [pre_processing]
//! window_size = 7
//! rolling_history = true
//! r_list = [7, 14]
//!
//! [dates]
//! train_start = "2017-01-07"
//! valid_start = "2018-05-05"
//! test_start = "2018-06-02"
//! test_end = "2018-06-30"
//! ```

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{ColumnNames, TableFiles};
use crate::walkforward::{generate_folds, DateWindow, DEFAULT_STEP_WEEKS, MAX_STEP_WEEKS};

/// Weeks between a fold's test start and its train end.
const FOLD_TRAIN_GAP_WEEKS: i64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} ({value}) must be after {bound_field} ({bound})")]
    DateOrder {
        field: &'static str,
        value: NaiveDate,
        bound_field: &'static str,
        bound: NaiveDate,
    },

    #[error(
        "dates.test_start ({test_start}) must be more than 5 weeks after \
         dates.train_start ({train_start}) to leave a walk-forward training window"
    )]
    TrainWindowTooShort {
        train_start: NaiveDate,
        test_start: NaiveDate,
    },

    #[error("step_weeks ({0}) must be between 1 and 520")]
    StepWeeks(i64),

    #[error("rolling features are computed over lag-1: pre_processing.window_size must be at least 1")]
    RollingWithoutLag,

    #[error("pre_processing.r_list contains a zero width")]
    ZeroRollingWidth,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Date boundaries of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentDates {
    pub train_start: NaiveDate,
    #[serde(default)]
    pub valid_start: Option<NaiveDate>,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
}

impl ExperimentDates {
    /// Check that the boundaries are strictly increasing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.valid_start {
            Some(valid_start) => {
                ensure_after("dates.valid_start", valid_start, "dates.train_start", self.train_start)?;
                ensure_after("dates.test_start", self.test_start, "dates.valid_start", valid_start)?;
            }
            None => {
                ensure_after("dates.test_start", self.test_start, "dates.train_start", self.train_start)?;
            }
        }
        ensure_after("dates.test_end", self.test_end, "dates.test_start", self.test_start)
    }

    /// Check that walk-forward folds get a non-empty training window.
    pub fn validate_for_folds(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.test_start - Duration::weeks(FOLD_TRAIN_GAP_WEEKS) <= self.train_start {
            return Err(ConfigError::TrainWindowTooShort {
                train_start: self.train_start,
                test_start: self.test_start,
            });
        }
        Ok(())
    }

    /// Fold schedule for these dates.
    pub fn folds(&self, step_weeks: i64) -> Vec<DateWindow> {
        generate_folds(self.train_start, self.test_start, self.test_end, step_weeks)
    }
}

fn ensure_after(
    field: &'static str,
    value: NaiveDate,
    bound_field: &'static str,
    bound: NaiveDate,
) -> Result<(), ConfigError> {
    if value > bound {
        Ok(())
    } else {
        Err(ConfigError::DateOrder {
            field,
            value,
            bound_field,
            bound,
        })
    }
}

/// How the feature table is cut into train/validate/test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Use the configured dates; validation only when `valid_start` is set.
    #[default]
    Dates,
    /// Use the boundaries of the first walk-forward fold.
    FirstFold,
}

/// Feature construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreProcessing {
    /// Number of lag columns (`lag-1 ..= lag-{window_size}`).
    pub window_size: usize,
    /// Expand the date into calendar columns.
    pub add_date_features: bool,
    /// Add rolling means over `lag-1`.
    pub rolling_history: bool,
    /// Rolling window widths.
    pub r_list: Vec<usize>,
}

impl Default for PreProcessing {
    fn default() -> Self {
        Self {
            window_size: 7,
            add_date_features: false,
            rolling_history: false,
            r_list: vec![7, 14, 28],
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_installments() -> i64 {
    2
}

fn default_step_weeks() -> i64 {
    DEFAULT_STEP_WEEKS
}

/// Configuration for one dataset build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Customer state to keep; all states when unset.
    #[serde(default)]
    pub state: Option<String>,

    /// Approval timestamps must be after this date.
    pub start_date: NaiveDate,

    /// Approval timestamps must be at or before this date.
    pub end_date: NaiveDate,

    /// Keep payments with fewer installments than this.
    #[serde(default = "default_max_installments")]
    pub max_installments: i64,

    /// Keep delivered orders only.
    #[serde(default = "default_true")]
    pub delivered_only: bool,

    #[serde(default)]
    pub pre_processing: PreProcessing,

    /// Categories to keep; empty keeps all.
    #[serde(default)]
    pub product_categories: Vec<String>,

    /// Drop the category column from the splits.
    #[serde(default)]
    pub rm_product_category: bool,

    /// Drop the date column from the splits.
    #[serde(default)]
    pub drop_date: bool,

    /// Reduce every split to the daily count.
    #[serde(default)]
    pub univariate: bool,

    pub dates: ExperimentDates,

    #[serde(default)]
    pub split_mode: SplitMode,

    /// Weeks between consecutive walk-forward folds.
    #[serde(default = "default_step_weeks")]
    pub step_weeks: i64,

    #[serde(default)]
    pub columns: ColumnNames,

    #[serde(default)]
    pub tables: TableFiles,
}

impl DatasetConfig {
    /// Create a configuration with defaults for everything but the dates.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, dates: ExperimentDates) -> Self {
        Self {
            state: None,
            start_date,
            end_date,
            max_installments: default_max_installments(),
            delivered_only: true,
            pre_processing: PreProcessing::default(),
            product_categories: Vec::new(),
            rm_product_category: false,
            drop_date: false,
            univariate: false,
            dates,
            split_mode: SplitMode::default(),
            step_weeks: DEFAULT_STEP_WEEKS,
            columns: ColumnNames::default(),
            tables: TableFiles::default(),
        }
    }

    /// Parse a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Whether rolling features will be built.
    pub fn uses_rolling(&self) -> bool {
        self.pre_processing.rolling_history && !self.pre_processing.r_list.is_empty()
    }

    /// Check the configuration before any data is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_after("end_date", self.end_date, "start_date", self.start_date)?;

        match self.split_mode {
            SplitMode::Dates => self.dates.validate()?,
            SplitMode::FirstFold => self.dates.validate_for_folds()?,
        }

        if !(1..=MAX_STEP_WEEKS).contains(&self.step_weeks) {
            return Err(ConfigError::StepWeeks(self.step_weeks));
        }

        if self.uses_rolling() {
            if self.pre_processing.window_size == 0 {
                return Err(ConfigError::RollingWithoutLag);
            }
            if self.pre_processing.r_list.contains(&0) {
                return Err(ConfigError::ZeroRollingWidth);
            }
        }

        Ok(())
    }
}
