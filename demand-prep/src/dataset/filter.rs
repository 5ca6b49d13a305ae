//! Row filter for the joined transaction table.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

use crate::data::{datetime_expr, ColumnNames, DELIVERED_STATUS};

use super::config::DatasetConfig;

/// Selects the transactions that feed the daily series.
///
/// Keeps rows where:
/// - the customer state matches (when set)
/// - `start_date < approval timestamp <= end_date`
/// - installments `< max_installments`
/// - the order was delivered (when `delivered_only`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    pub state: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_installments: i64,
    pub delivered_only: bool,
    pub columns: ColumnNames,
}

impl TransactionFilter {
    pub fn from_config(config: &DatasetConfig) -> Self {
        Self {
            state: config.state.clone(),
            start_date: config.start_date,
            end_date: config.end_date,
            max_installments: config.max_installments,
            delivered_only: config.delivered_only,
            columns: config.columns.clone(),
        }
    }

    /// Filter expression for [`LazyFrame::filter`], given the dtype of the
    /// timestamp column.
    ///
    /// The approval timestamp is compared as a `Datetime` against midnight of
    /// each bound: `start_date 00:00:00` itself is excluded, `end_date 00:00:00`
    /// is the last instant kept.
    pub fn predicate(&self, timestamp_dtype: &DataType) -> Expr {
        let timestamp = datetime_expr(self.columns.timestamp.as_str(), timestamp_dtype);

        let mut predicate = timestamp
            .clone()
            .gt(lit(midnight(self.start_date)))
            .and(timestamp.lt_eq(lit(midnight(self.end_date))))
            .and(col(self.columns.installments.as_str()).lt(lit(self.max_installments)));

        if let Some(state) = &self.state {
            predicate = predicate.and(col(self.columns.state.as_str()).eq(lit(state.clone())));
        }
        if self.delivered_only {
            predicate = predicate.and(col(self.columns.status.as_str()).eq(lit(DELIVERED_STATUS)));
        }

        predicate
    }

    pub fn apply(&self, mut lf: LazyFrame) -> PolarsResult<LazyFrame> {
        let schema = lf.collect_schema()?;
        let timestamp_dtype = schema
            .get(self.columns.timestamp.as_str())
            .cloned()
            .ok_or_else(|| {
                PolarsError::ColumnNotFound(self.columns.timestamp.clone().into())
            })?;
        Ok(lf.filter(self.predicate(&timestamp_dtype)))
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
