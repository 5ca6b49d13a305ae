//! Validation of resampled daily series.
//!
//! The feature builder assumes one row per category and day with no gaps;
//! these checks report where a table breaks that assumption.

pub mod series_integrity;

pub use series_integrity::{
    CheckResult, SeriesIntegrityReport, SeriesIntegrityValidator,
};
