//! Forecast error metrics.
//!
//! Scores a forecast against the observed daily counts:
//! - WMAE (weighted by the squared actual, both series shifted by +1)
//! - RMSE, MAE
//! - R²
//! - MAPE with a +1 shift so zero-demand days stay defined

pub mod calculator;

pub use calculator::{ForecastMetrics, MetricsCalculator, MetricsError};
