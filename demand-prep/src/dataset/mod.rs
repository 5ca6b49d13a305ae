//! Dataset assembly for forecasting experiments.
//!
//! Turns a joined transaction table into train/validate/test feature splits:
//! - Filter transactions by state, approval date, installments and status
//! - Resample to daily per-category counts
//! - Add lag, calendar and rolling features
//! - Cut splits from configured dates or walk-forward folds

pub mod assembler;
pub mod config;
pub mod filter;
pub mod resample;

pub use assembler::{
    DatasetBuilder, DatasetError, DatasetResult, DatasetSplits, FoldSplits, SplitData,
};
pub use config::{ConfigError, DatasetConfig, ExperimentDates, PreProcessing, SplitMode};
pub use filter::TransactionFilter;
pub use resample::resample_daily_counts;
