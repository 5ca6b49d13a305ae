//! Calendar features expanded from a date column.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::data::types::column_dates;

use super::{require_column, FeatureResult};

/// A calendar field derived from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    /// ISO 8601 week number.
    Week,
    Day,
    /// Monday = 0.
    Dayofweek,
    Dayofyear,
}

/// Calendar fields added by [`add_date_parts`], in column order.
pub const DATE_PARTS: [DatePart; 6] = [
    DatePart::Year,
    DatePart::Month,
    DatePart::Week,
    DatePart::Day,
    DatePart::Dayofweek,
    DatePart::Dayofyear,
];

impl DatePart {
    /// Column suffix for this part.
    pub fn name(self) -> &'static str {
        match self {
            DatePart::Year => "Year",
            DatePart::Month => "Month",
            DatePart::Week => "Week",
            DatePart::Day => "Day",
            DatePart::Dayofweek => "Dayofweek",
            DatePart::Dayofyear => "Dayofyear",
        }
    }

    pub fn of(self, date: NaiveDate) -> i32 {
        match self {
            DatePart::Year => date.year(),
            DatePart::Month => date.month() as i32,
            DatePart::Week => date.iso_week().week() as i32,
            DatePart::Day => date.day() as i32,
            DatePart::Dayofweek => date.weekday().num_days_from_monday() as i32,
            DatePart::Dayofyear => date.ordinal() as i32,
        }
    }
}

/// Prefix for calendar columns: the column name without a trailing `date`/`Date`.
pub fn date_part_prefix(date_column: &str) -> &str {
    date_column
        .strip_suffix("date")
        .or_else(|| date_column.strip_suffix("Date"))
        .unwrap_or(date_column)
}

/// Add year, month, ISO week, day, day-of-week (Monday = 0) and day-of-year
/// columns derived from `date_column`. With `drop` the source column is removed.
pub fn add_date_parts(df: &DataFrame, date_column: &str, drop: bool) -> FeatureResult<DataFrame> {
    let dates = column_dates(require_column(df, date_column)?)?;
    let prefix = date_part_prefix(date_column);

    let mut out = df.clone();
    for part in DATE_PARTS {
        let values: Vec<Option<i32>> = dates
            .iter()
            .map(|d| d.map(|d| part.of(d)))
            .collect();
        out.with_column(Series::new(format!("{}{}", prefix, part.name()).into(), values))?;
    }

    if drop {
        out = out.drop(date_column)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::date_series;

    fn int_column(df: &DataFrame, name: &str) -> Vec<Option<i32>> {
        df.column(name).unwrap().i32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_prefix() {
        assert_eq!(date_part_prefix("saledate"), "sale");
        assert_eq!(date_part_prefix("SaleDate"), "Sale");
        assert_eq!(date_part_prefix("order_approved_at"), "order_approved_at");
    }

    #[test]
    fn test_add_date_parts() {
        let days = [
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        ];
        let mut df = df! { "units" => &[3i64, 4] }.unwrap();
        df.with_column(date_series("date", &days).unwrap()).unwrap();

        let out = add_date_parts(&df, "date", false).unwrap();

        assert_eq!(out.width(), 8);
        assert_eq!(int_column(&out, "Year"), vec![Some(2018), Some(2018)]);
        assert_eq!(int_column(&out, "Month"), vec![Some(1), Some(12)]);
        // 2018-12-31 falls in ISO week 1 of 2019
        assert_eq!(int_column(&out, "Week"), vec![Some(1), Some(1)]);
        assert_eq!(int_column(&out, "Day"), vec![Some(1), Some(31)]);
        assert_eq!(int_column(&out, "Dayofweek"), vec![Some(0), Some(0)]);
        assert_eq!(int_column(&out, "Dayofyear"), vec![Some(1), Some(365)]);
    }

    #[test]
    fn test_each_part_reads_its_own_field() {
        // 2020-02-29: Saturday, ISO week 9, 60th day of a leap year
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        let parts: Vec<(&str, i32)> = DATE_PARTS.iter().map(|p| (p.name(), p.of(date))).collect();

        assert_eq!(
            parts,
            vec![
                ("Year", 2020),
                ("Month", 2),
                ("Week", 9),
                ("Day", 29),
                ("Dayofweek", 5),
                ("Dayofyear", 60),
            ]
        );
    }

    #[test]
    fn test_drop_source_column() {
        let df = df! { "order_approved_at" => &["2018-02-03 10:00:00"] }.unwrap();
        let out = add_date_parts(&df, "order_approved_at", true).unwrap();

        assert!(out.column("order_approved_at").is_err());
        assert_eq!(int_column(&out, "order_approved_atDayofweek"), vec![Some(5)]);
    }
}
