//! Lag features.

use polars::prelude::*;

use super::partition::{CategoryPartition, Grouping};
use super::{float_values, lag_column_name, FeatureResult};

/// Add `{prefix}-1 ..= {prefix}-{window_size}` to a copy of `df`.
///
/// `{prefix}-i` holds the value of `base_column` observed `i` rows earlier
/// within the same category, or null for the first `i` rows of a category.
/// Rows must already be in timestamp order within each category.
pub fn build_lag_features(
    df: &DataFrame,
    grouping: Grouping<'_>,
    window_size: usize,
    base_column: &str,
    prefix: &str,
) -> FeatureResult<DataFrame> {
    let base = float_values(df, base_column)?;
    let partition = CategoryPartition::from_frame(df, grouping)?;

    let mut out = df.clone();
    for lag in 1..=window_size {
        let shifted = partition.map_groups(&base, |values| shift(values, lag));
        out.with_column(Series::new(lag_column_name(prefix, lag).into(), shifted))?;
    }

    Ok(out)
}

/// Shift values forward by `lag` positions, padding the front with nulls.
pub(crate) fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= lag { values[i - lag] } else { None })
        .collect()
}
