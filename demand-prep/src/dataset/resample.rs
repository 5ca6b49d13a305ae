//! Daily per-category resampling.

use polars::prelude::*;

use crate::data::{column_dates, date_series, datetime_expr, ColumnNames};

const FIRST_DAY: &str = "first_day";
const LAST_DAY: &str = "last_day";

/// Count transactions per category and calendar day.
///
/// Only rows with a non-missing value are counted; NaN counts as missing.
/// Each category covers every day from its first to its last transaction;
/// days in between without transactions get a count of 0.
///
/// Returns category (`String`), timestamp (`Date`) and the count (`Int64`,
/// under the value column's name), sorted by category, then day.
pub fn resample_daily_counts(df: &DataFrame, columns: &ColumnNames) -> PolarsResult<DataFrame> {
    let category = columns.category.as_str();
    let timestamp = columns.timestamp.as_str();
    let value = columns.value.as_str();
    let timestamp_dtype = df.column(timestamp)?.dtype().clone();

    let counts = df
        .clone()
        .lazy()
        .select([
            col(category).cast(DataType::String),
            datetime_expr(timestamp, &timestamp_dtype)
                .dt()
                .date()
                .alias(timestamp),
            col(value).cast(DataType::Float64),
        ])
        // Rows without a category or a timestamp cannot be placed
        .filter(col(category).is_not_null().and(col(timestamp).is_not_null()))
        .group_by([col(category), col(timestamp)])
        .agg([col(value).drop_nans().count().cast(DataType::Int64)])
        .collect()?;

    category_calendar(&counts, category, timestamp)?
        .lazy()
        .join(
            counts.lazy(),
            [col(category), col(timestamp)],
            [col(category), col(timestamp)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col(value).fill_null(lit(0i64)))
        .sort([category, timestamp], SortMultipleOptions::default())
        .collect()
}

/// One row per category and day, spanning each category's observed days.
fn category_calendar(counts: &DataFrame, category: &str, timestamp: &str) -> PolarsResult<DataFrame> {
    let bounds = counts
        .clone()
        .lazy()
        .group_by([col(category)])
        .agg([
            col(timestamp).min().alias(FIRST_DAY),
            col(timestamp).max().alias(LAST_DAY),
        ])
        .sort([category], SortMultipleOptions::default())
        .collect()?;

    let firsts = column_dates(bounds.column(FIRST_DAY)?)?;
    let lasts = column_dates(bounds.column(LAST_DAY)?)?;

    let mut names = Vec::new();
    let mut days = Vec::new();
    for ((name, first), last) in bounds.column(category)?.str()?.into_iter().zip(firsts).zip(lasts) {
        let (Some(name), Some(first), Some(last)) = (name, first, last) else {
            continue;
        };
        for day in first.iter_days().take_while(|day| *day <= last) {
            names.push(name);
            days.push(day);
        }
    }

    DataFrame::new(vec![
        Series::new(category.into(), names).into(),
        date_series(timestamp, &days)?.into(),
    ])
}
