//! Core data types for the daily demand tables.
//!
//! The raw input is a joined order/payment table with one row per payment;
//! after resampling, every table carries one row per (category, day).

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Order status kept when only completed orders are wanted.
pub const DELIVERED_STATUS: &str = "delivered";

/// Column names of the joined transaction table.
///
/// The resampled daily table reuses `category`, `timestamp` and `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Product category key.
    pub category: String,
    /// Order approval timestamp.
    pub timestamp: String,
    /// Payment value; the daily count counts its non-null entries.
    pub value: String,
    /// Number of payment installments.
    pub installments: String,
    /// Order status.
    pub status: String,
    /// Customer state.
    pub state: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            category: "product_category_name".to_string(),
            timestamp: "order_approved_at".to_string(),
            value: "payment_value".to_string(),
            installments: "payment_installments".to_string(),
            status: "order_status".to_string(),
            state: "customer_state".to_string(),
        }
    }
}

/// One row of a resampled series: transactions of a category on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub category: String,
    pub date: NaiveDate,
    pub count: i64,
}

/// Convert days since Unix epoch to NaiveDate.
pub fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE).unwrap_or_default()
}

/// Convert a NaiveDate to days since Unix epoch.
pub fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Parse the calendar day of an ISO date or timestamp string.
///
/// Accepts `2017-10-02` as well as `2017-10-02 11:07:15`.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    s.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// Read a date-like column as calendar days.
///
/// Handles string, `Date` and `Datetime` columns; unparsable entries are null.
pub fn column_dates(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
    if column.dtype() == &DataType::String {
        return Ok(column.str()?.into_iter().map(|s| s.and_then(parse_day)).collect());
    }

    let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days.i32()?.into_iter().map(|d| d.map(date_from_days)).collect())
}

/// A date-like column as a `Datetime` expression.
///
/// Strings are parsed with an inferred ISO pattern; unparsable entries become
/// null. `Date` and other temporal columns are cast.
pub fn datetime_expr(name: &str, dtype: &DataType) -> Expr {
    match dtype {
        DataType::Datetime(_, _) => col(name),
        DataType::String => col(name).str().to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                strict: false,
                ..Default::default()
            },
            lit("raise"),
        ),
        _ => col(name).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
    }
}

/// Build a `Date` series from calendar days.
pub fn date_series(name: &str, dates: &[NaiveDate]) -> PolarsResult<Series> {
    let days: Vec<i32> = dates.iter().map(|d| days_from_date(*d)).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// Convert a resampled frame back into typed rows.
///
/// Expects the category, timestamp and value columns named in `columns`.
pub fn frame_to_daily_counts(df: &DataFrame, columns: &ColumnNames) -> PolarsResult<Vec<DailyCount>> {
    let categories = df.column(&columns.category)?.cast(&DataType::String)?;
    let dates = column_dates(df.column(&columns.timestamp)?)?;
    let counts = df.column(&columns.value)?.cast(&DataType::Int64)?;

    let rows = categories
        .str()?
        .into_iter()
        .zip(dates)
        .zip(counts.i64()?.into_iter())
        .filter_map(|((category, date), count)| {
            Some(DailyCount {
                category: category?.to_string(),
                date: date?,
                count: count.unwrap_or(0),
            })
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_from_days() {
        let date = date_from_days(18262);
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(days_from_date(date), 18262);
    }

    #[test]
    fn test_parse_day() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2);
        assert_eq!(parse_day("2017-10-02 11:07:15"), expected);
        assert_eq!(parse_day("2017-10-02"), expected);
        assert_eq!(parse_day("2017-10"), None);
        assert_eq!(parse_day("not a date"), None);
    }

    #[test]
    fn test_column_dates_from_strings_and_dates() {
        let strings = Column::new("ts".into(), &[Some("2018-01-05 09:00:00"), None]);
        let parsed = column_dates(&strings).unwrap();
        assert_eq!(parsed, vec![NaiveDate::from_ymd_opt(2018, 1, 5), None]);

        let day = NaiveDate::from_ymd_opt(2018, 3, 1).unwrap();
        let dates: Column = date_series("ts", &[day]).unwrap().into();
        assert_eq!(column_dates(&dates).unwrap(), vec![Some(day)]);
    }

    #[test]
    fn test_default_column_names() {
        let columns = ColumnNames::default();
        assert_eq!(columns.category, "product_category_name");
        assert_eq!(columns.timestamp, "order_approved_at");
        assert_eq!(columns.value, "payment_value");
    }
}
