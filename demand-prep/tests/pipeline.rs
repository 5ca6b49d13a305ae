use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use demand_prep::data::column_dates;
use demand_prep::dataset::{DatasetBuilder, DatasetConfig, ExperimentDates, SplitMode};
use demand_prep::features::lag_column_name;
use demand_prep::walkforward::generate_folds;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Joined transactions for three categories over 2018-01-01..2018-04-30.
///
/// Each category starts on a different day and sells a day-dependent number
/// of items, with some days empty.
fn joined_transactions() -> LazyFrame {
    let mut category = Vec::new();
    let mut timestamp = Vec::new();
    let mut value = Vec::new();

    for (name, first_day, modulus) in [("toys", 0, 3), ("garden", 5, 4), ("books", 12, 5)] {
        for offset in first_day..120 {
            let day = date(2018, 1, 1) + Duration::days(offset);
            for item in 0..(offset % modulus) {
                category.push(name);
                timestamp.push(format!("{} {:02}:15:00", day, 8 + item));
                value.push(19.9);
            }
        }
    }

    let n = category.len();
    df! {
        "product_category_name" => category,
        "order_approved_at" => timestamp,
        "payment_value" => value,
        "payment_installments" => vec![1i64; n],
        "order_status" => vec!["delivered"; n],
        "customer_state" => vec!["SP"; n],
    }
    .unwrap()
    .lazy()
}

fn config() -> DatasetConfig {
    let mut config = DatasetConfig::new(
        date(2017, 12, 31),
        date(2018, 5, 1),
        ExperimentDates {
            train_start: date(2018, 1, 6),
            valid_start: Some(date(2018, 3, 3)),
            test_start: date(2018, 3, 31),
            test_end: date(2018, 4, 28),
        },
    );
    config.pre_processing.window_size = 3;
    config
}

#[test]
fn test_default_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
    let config = DatasetConfig::from_toml_file(path).unwrap();

    assert_eq!(config.state.as_deref(), Some("SP"));
    assert_eq!(config.pre_processing.r_list, vec![7, 14, 28]);
    assert!(DatasetBuilder::new(config).is_ok());
}

#[test]
fn test_lags_only_read_earlier_days() {
    let builder = DatasetBuilder::new(config()).unwrap();
    let table = builder.feature_table(joined_transactions()).unwrap();

    let categories: Vec<String> = table
        .column("product_category_name")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|c| c.unwrap().to_string())
        .collect();
    let days: Vec<NaiveDate> = column_dates(table.column("order_approved_at").unwrap())
        .unwrap()
        .into_iter()
        .map(Option::unwrap)
        .collect();
    let counts: Vec<i64> = table
        .column("payment_value")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();

    let observed: HashMap<(&str, NaiveDate), i64> = categories
        .iter()
        .zip(&days)
        .zip(&counts)
        .map(|((c, d), n)| ((c.as_str(), *d), *n))
        .collect();

    for lag in 1..=3 {
        let lagged: Vec<Option<f64>> = table
            .column(&lag_column_name("lag", lag))
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        for i in 0..table.height() {
            let earlier = days[i] - Duration::days(lag as i64);
            let expected = observed
                .get(&(categories[i].as_str(), earlier))
                .map(|n| *n as f64);
            assert_eq!(lagged[i], expected, "lag {} row {}", lag, i);
        }
    }
}

#[test]
fn test_each_category_starts_with_lag_nulls() {
    let builder = DatasetBuilder::new(config()).unwrap();
    let table = builder.feature_table(joined_transactions()).unwrap();

    let lag2: Vec<Option<f64>> = table.column("lag-2").unwrap().f64().unwrap().into_iter().collect();
    let categories = table.column("product_category_name").unwrap().str().unwrap();

    for name in ["toys", "garden", "books"] {
        let nulls = categories
            .into_iter()
            .zip(&lag2)
            .filter(|(c, v)| *c == Some(name) && v.is_none())
            .count();
        assert_eq!(nulls, 2, "category {}", name);
    }
}

#[test]
fn test_splits_partition_the_date_range() {
    let builder = DatasetBuilder::new(config()).unwrap();
    let splits = builder.build(joined_transactions()).unwrap();

    let bounds = |df: &DataFrame| {
        let days: Vec<NaiveDate> = column_dates(df.column("order_approved_at").unwrap())
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        (days[0], days[days.len() - 1])
    };

    let train = splits.train.as_frame().unwrap();
    let valid = splits.valid.as_ref().and_then(|v| v.as_frame()).unwrap();
    let test = splits.test.as_frame().unwrap();

    assert_eq!(bounds(train), (date(2018, 1, 6), date(2018, 3, 2)));
    assert_eq!(bounds(valid), (date(2018, 3, 3), date(2018, 3, 30)));
    assert_eq!(bounds(test), (date(2018, 3, 31), date(2018, 4, 28)));

    // All three categories are active from 2018-01-13 on
    assert_eq!(valid.height(), 3 * 28);
    assert_eq!(test.height(), 3 * 29);
}

#[test]
fn test_univariate_without_category() {
    let mut config = config();
    config.univariate = true;
    config.rm_product_category = true;
    let splits = DatasetBuilder::new(config).unwrap().build(joined_transactions()).unwrap();

    for (name, split) in splits.named() {
        let target = split.as_target().unwrap_or_else(|| panic!("{} is not a target", name));
        assert_eq!(target.dtype(), &DataType::Int64);
    }
}

#[test]
fn test_walk_forward_matches_schedule() {
    let mut config = config();
    config.split_mode = SplitMode::FirstFold;
    config.pre_processing.rolling_history = true;
    config.pre_processing.r_list = vec![7];
    let builder = DatasetBuilder::new(config).unwrap();

    let expected = generate_folds(date(2018, 1, 6), date(2018, 3, 31), date(2018, 4, 28), 4);
    assert_eq!(builder.folds(), expected);

    let folds = builder.build_walk_forward(joined_transactions()).unwrap();
    assert_eq!(folds.len(), expected.len());

    let first = builder.build(joined_transactions()).unwrap();
    assert_eq!(first.train.len(), folds[0].splits.train.len());
    assert_eq!(first.test.len(), folds[0].splits.test.len());

    for fold in &folds {
        let train = fold.splits.train.as_frame().unwrap();
        assert!(train.column("lag-1-rolling-7").is_ok());
    }
}
