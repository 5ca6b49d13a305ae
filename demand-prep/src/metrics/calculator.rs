//! Forecast metrics calculator.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MetricsError {
    #[error("Series lengths differ: {actual} actual vs {predicted} predicted")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("Cannot score an empty series")]
    Empty,
}

/// Error metrics of one forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub wmae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub mape: f64,
    pub mae: f64,
}

impl ForecastMetrics {
    /// Generate a summary report.
    pub fn summary(&self) -> String {
        format!(
            "Forecast Metrics\n\
             ================\n\
             WMAE: {:.4}\n\
             RMSE: {:.4}\n\
             R2:   {:.4}\n\
             MAPE: {:.2}%\n\
             MAE:  {:.4}",
            self.wmae,
            self.rmse,
            self.r2,
            self.mape * 100.0,
            self.mae
        )
    }
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate all metrics for a forecast.
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<ForecastMetrics, MetricsError> {
        Self::check_lengths(actual, predicted)?;

        Ok(ForecastMetrics {
            wmae: Self::wmae(actual, predicted),
            rmse: Self::rmse(actual, predicted),
            r2: Self::r2(actual, predicted),
            mape: Self::mape(actual, predicted),
            mae: Self::mae(actual, predicted),
        })
    }

    fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<(), MetricsError> {
        if actual.len() != predicted.len() {
            return Err(MetricsError::LengthMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(MetricsError::Empty);
        }
        Ok(())
    }

    /// Weighted mean absolute error.
    ///
    /// Both series are shifted by +1; each absolute error is weighted by the
    /// squared shifted actual and divided by the largest shifted actual, so
    /// errors on high-demand days dominate.
    pub fn wmae(actual: &[f64], predicted: &[f64]) -> f64 {
        let shifted: Vec<f64> = actual.iter().map(|a| a + 1.0).collect();
        let max_actual = shifted.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        shifted
            .iter()
            .zip(predicted)
            .map(|(a, p)| {
                let weight = if *a == 0.0 { 1.0 } else { *a };
                (a - (p + 1.0)).abs() * weight * weight / max_actual
            })
            .mean()
    }

    /// Root mean squared error.
    pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
        actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .mean()
            .sqrt()
    }

    /// Mean absolute error.
    pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
        actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).mean()
    }

    /// Mean absolute percentage error of the +1 shifted series, as a fraction.
    pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
        actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| ((a - p) / (a + 1.0)).abs())
            .mean()
    }

    /// Coefficient of determination.
    ///
    /// A constant actual series scores 1.0 when predicted exactly, else 0.0.
    pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
        let mean = actual.mean();
        let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_perfect_forecast() {
        let actual = [0.0, 3.0, 5.0, 2.0];
        let metrics = MetricsCalculator::calculate(&actual, &actual).unwrap();

        assert_close(metrics.wmae, 0.0);
        assert_close(metrics.rmse, 0.0);
        assert_close(metrics.mae, 0.0);
        assert_close(metrics.mape, 0.0);
        assert_close(metrics.r2, 1.0);
    }

    #[test]
    fn test_error_metrics() {
        let actual = [1.0, 3.0];
        let predicted = [2.0, 1.0];

        assert_close(MetricsCalculator::mae(&actual, &predicted), 1.5);
        assert_close(MetricsCalculator::rmse(&actual, &predicted), 2.5f64.sqrt());
        // |1 - 2| / 2 and |3 - 1| / 4
        assert_close(MetricsCalculator::mape(&actual, &predicted), 0.5);
        // Shifted actuals 2 and 4: (1 * 4 / 4 + 2 * 16 / 4) / 2
        assert_close(MetricsCalculator::wmae(&actual, &predicted), 4.5);
        // ss_res = 5, ss_tot = 2
        assert_close(MetricsCalculator::r2(&actual, &predicted), -1.5);
    }

    #[test]
    fn test_constant_actual_r2() {
        assert_close(MetricsCalculator::r2(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_close(MetricsCalculator::r2(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            MetricsCalculator::calculate(&[1.0], &[1.0, 2.0]),
            Err(MetricsError::LengthMismatch { actual: 1, predicted: 2 })
        );
        assert_eq!(MetricsCalculator::calculate(&[], &[]), Err(MetricsError::Empty));
    }

    #[test]
    fn test_summary() {
        let metrics = MetricsCalculator::calculate(&[1.0, 3.0], &[2.0, 1.0]).unwrap();
        let summary = metrics.summary();
        assert!(summary.contains("MAPE: 50.00%"));
        assert!(summary.contains("R2:   -1.5000"));
    }
}
