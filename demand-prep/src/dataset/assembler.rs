//! Dataset assembly: filter, resample, featurize, split.

use std::collections::HashSet;

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::column_dates;
use crate::features::{
    add_date_parts, build_lag_features, build_rolling_features, lag_column_name, FeatureError,
    Grouping, LAG_PREFIX,
};
use crate::validation::SeriesIntegrityValidator;
use crate::walkforward::DateWindow;

use super::config::{ConfigError, DatasetConfig, ExperimentDates, SplitMode};
use super::filter::TransactionFilter;
use super::resample::resample_daily_counts;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// One split: the full feature table, or only the target column.
#[derive(Debug, Clone)]
pub enum SplitData {
    Frame(DataFrame),
    Target(Series),
}

impl SplitData {
    pub fn len(&self) -> usize {
        match self {
            SplitData::Frame(df) => df.height(),
            SplitData::Target(series) => series.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            SplitData::Frame(df) => Some(df),
            SplitData::Target(_) => None,
        }
    }

    pub fn as_target(&self) -> Option<&Series> {
        match self {
            SplitData::Target(series) => Some(series),
            SplitData::Frame(_) => None,
        }
    }

    /// A target becomes a single-column frame.
    pub fn into_frame(self) -> DataFrame {
        match self {
            SplitData::Frame(df) => df,
            SplitData::Target(series) => series.into_frame(),
        }
    }
}

/// Train/validate/test splits of one build.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: SplitData,
    pub valid: Option<SplitData>,
    pub test: SplitData,
}

impl DatasetSplits {
    /// Splits paired with their names, skipping an absent validation split.
    pub fn named(&self) -> Vec<(&'static str, &SplitData)> {
        let mut named = vec![("train", &self.train)];
        if let Some(valid) = &self.valid {
            named.push(("valid", valid));
        }
        named.push(("test", &self.test));
        named
    }
}

/// Splits cut with one walk-forward fold's boundaries.
#[derive(Debug, Clone)]
pub struct FoldSplits {
    pub window: DateWindow,
    pub splits: DatasetSplits,
}

/// Day range `[start, end)`, or `[start, end]` when `inclusive_end`.
#[derive(Debug, Clone, Copy)]
struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
    inclusive_end: bool,
}

impl DayRange {
    fn half_open(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end, inclusive_end: false }
    }

    fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end, inclusive_end: true }
    }

    fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && (day < self.end || (self.inclusive_end && day == self.end))
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitBounds {
    train: DayRange,
    valid: Option<DayRange>,
    test: DayRange,
}

impl SplitBounds {
    fn from_dates(dates: &ExperimentDates) -> Self {
        let train_end = dates.valid_start.unwrap_or(dates.test_start);
        Self {
            train: DayRange::half_open(dates.train_start, train_end),
            valid: dates
                .valid_start
                .map(|valid_start| DayRange::half_open(valid_start, dates.test_start)),
            test: DayRange::closed(dates.test_start, dates.test_end),
        }
    }

    fn from_window(window: &DateWindow) -> Self {
        Self {
            train: DayRange::half_open(window.train_start, window.valid_start),
            valid: Some(DayRange::half_open(window.valid_start, window.test_start)),
            test: DayRange::closed(window.test_start, window.test_end),
        }
    }
}

/// Builds feature datasets from a joined transaction table.
pub struct DatasetBuilder {
    config: DatasetConfig,
    filter: TransactionFilter,
}

impl DatasetBuilder {
    /// Validate `config` and create a builder for it.
    pub fn new(config: DatasetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = TransactionFilter::from_config(&config);
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Walk-forward fold schedule for the configured dates.
    pub fn folds(&self) -> Vec<DateWindow> {
        self.config.dates.folds(self.config.step_weeks)
    }

    /// Filter the raw table and resample it to daily per-category counts.
    pub fn daily_counts(&self, raw: LazyFrame) -> DatasetResult<DataFrame> {
        let columns = &self.config.columns;

        let filtered = self.filter.apply(raw)?.collect()?;
        info!("{} transactions after filtering", filtered.height());

        let daily = resample_daily_counts(&filtered, columns)?;
        let report = SeriesIntegrityValidator::new().validate_frame(&daily, columns)?;
        if !report.all_passed() {
            for check in report.failed_checks() {
                warn!(
                    "Integrity check {} failed: {} {}",
                    check.name,
                    check.message,
                    check.details.as_deref().unwrap_or("")
                );
            }
        }
        info!("Resampled to {}", report.summary());

        Ok(daily)
    }

    /// Daily table with every configured feature, before splitting.
    pub fn feature_table(&self, raw: LazyFrame) -> DatasetResult<DataFrame> {
        let columns = &self.config.columns;
        let pre = &self.config.pre_processing;
        let grouping = Grouping::Column(&columns.category);

        let daily = self.daily_counts(raw)?;

        let mut table = build_lag_features(
            &daily,
            grouping,
            pre.window_size,
            &columns.value,
            LAG_PREFIX,
        )?;
        for lag in 1..=pre.window_size {
            let name = lag_column_name(LAG_PREFIX, lag);
            debug!("{}: {} nulls", name, table.column(&name)?.null_count());
        }

        if pre.add_date_features {
            table = add_date_parts(&table, &columns.timestamp, false)?;
        }

        if !self.config.product_categories.is_empty() {
            table = self.retain_categories(&table)?;
        }

        if self.config.uses_rolling() {
            let source = lag_column_name(LAG_PREFIX, 1);
            table = build_rolling_features(&table, grouping, &pre.r_list, &source)?;
        }

        if self.config.rm_product_category {
            table = table.drop(&columns.category)?;
        }

        debug!("Feature table: {} rows, {} columns", table.height(), table.width());
        Ok(table)
    }

    /// Build the splits selected by `split_mode`.
    pub fn build(&self, raw: LazyFrame) -> DatasetResult<DatasetSplits> {
        let bounds = match self.config.split_mode {
            SplitMode::Dates => SplitBounds::from_dates(&self.config.dates),
            SplitMode::FirstFold => {
                let folds = self.folds();
                let first = folds
                    .first()
                    .ok_or_else(|| DatasetError::InvalidData("empty fold schedule".to_string()))?;
                SplitBounds::from_window(first)
            }
        };

        let table = self.feature_table(raw)?;
        self.split(&table, &bounds)
    }

    /// Build one set of splits per walk-forward fold over a shared feature table.
    pub fn build_walk_forward(&self, raw: LazyFrame) -> DatasetResult<Vec<FoldSplits>> {
        self.config.dates.validate_for_folds()?;

        let folds = self.folds();
        info!("Generated {} walk-forward folds", folds.len());

        let table = self.feature_table(raw)?;
        folds
            .into_iter()
            .map(|window| {
                let splits = self.split(&table, &SplitBounds::from_window(&window))?;
                debug!(
                    "Fold {}: train={} valid={} test={}",
                    window.fold,
                    splits.train.len(),
                    splits.valid.as_ref().map_or(0, SplitData::len),
                    splits.test.len()
                );
                Ok(FoldSplits { window, splits })
            })
            .collect()
    }

    fn retain_categories(&self, table: &DataFrame) -> DatasetResult<DataFrame> {
        let allowed: HashSet<&str> = self
            .config
            .product_categories
            .iter()
            .map(String::as_str)
            .collect();

        let categories = table.column(&self.config.columns.category)?.str()?;
        let present: HashSet<&str> = categories.into_iter().flatten().collect();
        for missing in allowed.difference(&present) {
            warn!("Category {} has no transactions", missing);
        }

        let keep: Vec<bool> = categories
            .into_iter()
            .map(|c| c.is_some_and(|c| allowed.contains(c)))
            .collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Ok(table.filter(&mask)?)
    }

    fn split(&self, table: &DataFrame, bounds: &SplitBounds) -> DatasetResult<DatasetSplits> {
        let days = column_dates(table.column(&self.config.columns.timestamp)?)?;

        let train = self.slice(table, &days, &bounds.train)?;
        if train.is_empty() {
            warn!("Training split is empty");
        }
        let valid = bounds
            .valid
            .map(|range| self.slice(table, &days, &range))
            .transpose()?;
        let test = self.slice(table, &days, &bounds.test)?;

        Ok(DatasetSplits { train, valid, test })
    }

    fn slice(
        &self,
        table: &DataFrame,
        days: &[Option<NaiveDate>],
        range: &DayRange,
    ) -> DatasetResult<SplitData> {
        let columns = &self.config.columns;

        let keep: Vec<bool> = days
            .iter()
            .map(|d| d.is_some_and(|d| range.contains(d)))
            .collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let mut split = table.filter(&mask)?.sort(
            [columns.timestamp.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        if self.config.univariate {
            let target = split.column(&columns.value)?.as_materialized_series().clone();
            return Ok(SplitData::Target(target));
        }
        if self.config.drop_date {
            split = split.drop(&columns.timestamp)?;
        }

        Ok(SplitData::Frame(split))
    }
}
