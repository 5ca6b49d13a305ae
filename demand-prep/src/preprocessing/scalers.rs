//! Min-max and standardization scalers.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("{0} scaler used before fit")]
    NotFitted(&'static str),

    #[error("No non-missing values to fit on")]
    NoValues,

    #[error("Fitted values have zero spread")]
    ZeroSpread,

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type ScalerResult<T> = Result<T, ScalerError>;

/// A scaler fitted on one pool of values. NaN marks a missing value.
pub trait Scaler {
    /// Learn the scaling parameters, skipping NaN.
    fn fit(&mut self, values: &[f64]) -> ScalerResult<()>;

    fn transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>>;

    fn inverse_transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>>;

    fn name(&self) -> &'static str;

    fn fit_transform(&mut self, values: &[f64]) -> ScalerResult<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }
}

fn non_missing(values: &[f64]) -> ScalerResult<Vec<f64>> {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return Err(ScalerError::NoValues);
    }
    Ok(present)
}

/// Scales into `[0, 1]` with the pooled minimum and maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    range: Option<(f64, f64)>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted `(min, max)`.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    fn fitted(&self) -> ScalerResult<(f64, f64)> {
        self.range.ok_or(ScalerError::NotFitted(self.name()))
    }
}

impl Scaler for MinMaxScaler {
    fn fit(&mut self, values: &[f64]) -> ScalerResult<()> {
        let present = non_missing(values)?;
        let min = Statistics::min(present.as_slice());
        let max = Statistics::max(present.as_slice());
        if max == min {
            return Err(ScalerError::ZeroSpread);
        }
        self.range = Some((min, max));
        Ok(())
    }

    fn transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>> {
        let (min, max) = self.fitted()?;
        Ok(values.iter().map(|v| (v - min) / (max - min)).collect())
    }

    fn inverse_transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>> {
        let (min, max) = self.fitted()?;
        Ok(values.iter().map(|v| v * (max - min) + min).collect())
    }

    fn name(&self) -> &'static str {
        "min-max"
    }
}

/// Scales to zero mean and unit population standard deviation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    moments: Option<(f64, f64)>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted `(mean, std_dev)`.
    pub fn moments(&self) -> Option<(f64, f64)> {
        self.moments
    }

    fn fitted(&self) -> ScalerResult<(f64, f64)> {
        self.moments.ok_or(ScalerError::NotFitted(self.name()))
    }
}

impl Scaler for StandardScaler {
    fn fit(&mut self, values: &[f64]) -> ScalerResult<()> {
        let present = non_missing(values)?;
        let mean = Statistics::mean(present.as_slice());
        let std_dev = Statistics::population_std_dev(present.as_slice());
        if std_dev == 0.0 {
            return Err(ScalerError::ZeroSpread);
        }
        self.moments = Some((mean, std_dev));
        Ok(())
    }

    fn transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>> {
        let (mean, std_dev) = self.fitted()?;
        Ok(values.iter().map(|v| (v - mean) / std_dev).collect())
    }

    fn inverse_transform(&self, values: &[f64]) -> ScalerResult<Vec<f64>> {
        let (mean, std_dev) = self.fitted()?;
        Ok(values.iter().map(|v| v * std_dev + mean).collect())
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Values of `columns` as floats, nulls as NaN, column after column.
fn pooled_values(df: &DataFrame, columns: &[&str]) -> ScalerResult<Vec<Vec<f64>>> {
    columns
        .iter()
        .map(|name| {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            Ok(column
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect())
        })
        .collect()
}

fn replace_columns<F>(df: &DataFrame, columns: &[&str], mut f: F) -> ScalerResult<DataFrame>
where
    F: FnMut(&[f64]) -> ScalerResult<Vec<f64>>,
{
    let mut out = df.clone();
    for (name, values) in columns.iter().zip(pooled_values(df, columns)?) {
        let scaled: Vec<Option<f64>> = f(&values)?
            .into_iter()
            .map(|v| if v.is_nan() { None } else { Some(v) })
            .collect();
        out.with_column(Series::new((*name).into(), scaled))?;
    }
    Ok(out)
}

/// Fit `scaler` on every value of `columns` pooled together.
pub fn fit_frame<S: Scaler>(scaler: &mut S, df: &DataFrame, columns: &[&str]) -> ScalerResult<()> {
    let pooled: Vec<f64> = pooled_values(df, columns)?.into_iter().flatten().collect();
    scaler.fit(&pooled)
}

/// Replace `columns` with their scaled values.
pub fn transform_frame<S: Scaler>(scaler: &S, df: &DataFrame, columns: &[&str]) -> ScalerResult<DataFrame> {
    replace_columns(df, columns, |values| scaler.transform(values))
}

/// Replace `columns` with their unscaled values.
pub fn inverse_transform_frame<S: Scaler>(
    scaler: &S,
    df: &DataFrame,
    columns: &[&str],
) -> ScalerResult<DataFrame> {
    replace_columns(df, columns, |values| scaler.inverse_transform(values))
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
    fn test_min_max_ignores_nan() {
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&[f64::NAN, 2.0, 4.0, 6.0]).unwrap();

        assert_eq!(scaler.range(), Some((2.0, 6.0)));
        assert!(scaled[0].is_nan());
        assert_eq!(&scaled[1..], &[0.0, 0.5, 1.0]);

        let restored = scaler.inverse_transform(&scaled[1..]).unwrap();
        assert_eq!(restored, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_standard_uses_population_std() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[1.0, 2.0, 3.0, 4.0, f64::NAN]).unwrap();

        let (mean, std_dev) = scaler.moments().unwrap();
        assert_close(mean, 2.5);
        assert_close(std_dev, 1.25f64.sqrt());

        let scaled = scaler.transform(&[2.5, 4.0]).unwrap();
        assert_close(scaled[0], 0.0);
        assert_close(scaled[1], 1.5 / 1.25f64.sqrt());
    }

    #[test]
    fn test_unfitted_and_degenerate() {
        assert!(matches!(
            MinMaxScaler::new().transform(&[1.0]),
            Err(ScalerError::NotFitted("min-max"))
        ));
        assert!(matches!(
            StandardScaler::new().fit(&[f64::NAN]),
            Err(ScalerError::NoValues)
        ));
        assert!(matches!(
            MinMaxScaler::new().fit(&[3.0, 3.0]),
            Err(ScalerError::ZeroSpread)
        ));
    }

    #[test]
    fn test_frame_scaling_pools_columns() {
        let df = df! {
            "category" => &["toys", "toys", "toys"],
            "lag-1" => &[None, Some(0.0), Some(5.0)],
            "lag-2" => &[None, None, Some(10.0)],
        }
        .unwrap();
        let columns = ["lag-1", "lag-2"];

        let mut scaler = MinMaxScaler::new();
        fit_frame(&mut scaler, &df, &columns).unwrap();
        assert_eq!(scaler.range(), Some((0.0, 10.0)));

        let scaled = transform_frame(&scaler, &df, &columns).unwrap();
        let lag1: Vec<Option<f64>> = scaled.column("lag-1").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(lag1, vec![None, Some(0.0), Some(0.5)]);
        assert_eq!(scaled.column("category").unwrap().len(), 3);

        let restored = inverse_transform_frame(&scaler, &scaled, &columns).unwrap();
        let lag2: Vec<Option<f64>> = restored.column("lag-2").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(lag2, vec![None, None, Some(10.0)]);
    }
}
