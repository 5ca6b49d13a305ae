//! Leakage-safe feature construction for per-category daily series.
//!
//! - Lag features: value shifted by 1..=W steps within a category
//! - Rolling means over `lag-1`, rounded to 2 decimals
//! - Calendar parts expanded from the date column
//!
//! All builders keep the input row order and row count. Per-category work
//! goes through [`CategoryPartition`], which records every row's original
//! position and scatters results back into place.

pub mod calendar;
pub mod lag;
pub mod partition;
pub mod rolling;

use polars::prelude::*;
use thiserror::Error;

pub use calendar::{add_date_parts, date_part_prefix, DatePart, DATE_PARTS};
pub use lag::build_lag_features;
pub use partition::{CategoryGroup, CategoryPartition, Grouping};
pub use rolling::{build_rolling_features, rolling_column_name};

/// Default prefix for lag columns (`lag-1`, `lag-2`, ...).
pub const LAG_PREFIX: &str = "lag";

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Rolling window width must be at least 1")]
    ZeroWindow,

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type FeatureResult<T> = Result<T, FeatureError>;

/// Name of the `i`-th lag column for a prefix.
pub fn lag_column_name(prefix: &str, lag: usize) -> String {
    format!("{}-{}", prefix, lag)
}

/// Look up a column, reporting its name when it is absent.
pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> FeatureResult<&'a Column> {
    df.column(name)
        .map_err(|_| FeatureError::MissingColumn(name.to_string()))
}

/// Read a numeric column as floats. NaN is treated as missing.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> FeatureResult<Vec<Option<f64>>> {
    let column = require_column(df, name)?.cast(&DataType::Float64)?;
    let values = column
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}
