//! Rolling mean features.
//!
//! Rolling means are taken over a lag column (normally `lag-1`), never over
//! the raw target, so the value at day T only aggregates days before T.

use polars::prelude::*;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::partition::{CategoryPartition, Grouping};
use super::{float_values, FeatureError, FeatureResult};

/// Name of the rolling column for a source column and width.
pub fn rolling_column_name(source_column: &str, width: usize) -> String {
    format!("{}-rolling-{}", source_column, width)
}

/// Add `{source_column}-rolling-{r}` for every `r` in `r_list`.
///
/// Each value is the mean of the trailing `r` values of `source_column`
/// (current row included) within the row's category, rounded to 2 decimals.
/// Rows without `r` non-missing values in their window get null.
/// With [`Grouping::Single`] the frame is treated as one series.
pub fn build_rolling_features(
    df: &DataFrame,
    grouping: Grouping<'_>,
    r_list: &[usize],
    source_column: &str,
) -> FeatureResult<DataFrame> {
    if r_list.contains(&0) {
        return Err(FeatureError::ZeroWindow);
    }

    let source = float_values(df, source_column)?;
    let partition = CategoryPartition::from_frame(df, grouping)?;

    let mut out = df.clone();
    for &width in r_list {
        let means = partition.map_groups(&source, |values| rolling_mean(values, width));
        out.with_column(Series::new(
            rolling_column_name(source_column, width).into(),
            means,
        ))?;
    }

    Ok(out)
}

/// Trailing mean over `width` values, null until a full window is present.
pub(crate) fn rolling_mean(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < width {
                return None;
            }
            let window: Vec<f64> = values[i + 1 - width..=i].iter().copied().collect::<Option<_>>()?;
            Some(mean_to_hundredths(&window))
        })
        .collect()
}

/// Mean rounded to 2 decimal places, ties to even.
///
/// Summed and divided in decimal arithmetic, so a mean that is exactly a tie
/// (1/40 = 0.025) rounds as one. Values outside `Decimal` range fall back to
/// float arithmetic.
pub(crate) fn mean_to_hundredths(values: &[f64]) -> f64 {
    let decimal_mean = values
        .iter()
        .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(Decimal::from_f64(*v)?))
        .and_then(|sum| sum.checked_div(Decimal::from(values.len())))
        .map(|mean| mean.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|mean| mean.to_f64());

    decimal_mean.unwrap_or_else(|| {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (mean * 100.0).round_ties_even() / 100.0
    })
}
