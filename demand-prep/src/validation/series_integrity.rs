//! Integrity checks for resampled daily series.
//!
//! Validates:
//! - Ordering (days ascending within each category)
//! - Uniqueness (one row per category and day)
//! - Continuity (no missing days between a category's first and last day)
//! - Counts (no negative values)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::data::{frame_to_daily_counts, ColumnNames, DailyCount};

/// Maximum number of offending entries listed in a check's details.
const MAX_DETAILS: usize = 5;

/// Result of a single validation check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one daily table.
#[derive(Debug)]
pub struct SeriesIntegrityReport {
    pub rows: usize,
    pub categories: usize,
    pub checks: Vec<CheckResult>,
}

impl SeriesIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} rows, {} categories: {}/{} checks passed",
            self.rows,
            self.categories,
            passed,
            self.checks.len()
        )
    }
}

/// Validator for the contiguous-daily-steps invariant.
#[derive(Debug, Default)]
pub struct SeriesIntegrityValidator;

impl SeriesIntegrityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run all checks on typed rows, in table order.
    pub fn validate(&self, rows: &[DailyCount]) -> SeriesIntegrityReport {
        let mut by_category: BTreeMap<&str, Vec<NaiveDate>> = BTreeMap::new();
        for row in rows {
            by_category.entry(row.category.as_str()).or_default().push(row.date);
        }

        let checks = vec![
            self.check_ordering(&by_category),
            self.check_uniqueness(&by_category),
            self.check_continuity(&by_category),
            self.check_counts(rows),
        ];

        SeriesIntegrityReport {
            rows: rows.len(),
            categories: by_category.len(),
            checks,
        }
    }

    /// Run all checks on a daily table.
    pub fn validate_frame(
        &self,
        df: &DataFrame,
        columns: &ColumnNames,
    ) -> PolarsResult<SeriesIntegrityReport> {
        Ok(self.validate(&frame_to_daily_counts(df, columns)?))
    }

    fn check_ordering(&self, by_category: &BTreeMap<&str, Vec<NaiveDate>>) -> CheckResult {
        let unordered: Vec<&str> = by_category
            .iter()
            .filter(|(_, dates)| dates.windows(2).any(|w| w[1] < w[0]))
            .map(|(category, _)| *category)
            .collect();

        if unordered.is_empty() {
            CheckResult::pass("date_ordering", "Days ascending within every category")
        } else {
            CheckResult::fail(
                "date_ordering",
                &format!("{} categories out of order", unordered.len()),
                Some(abbreviate(unordered.iter().map(|c| c.to_string()))),
            )
        }
    }

    fn check_uniqueness(&self, by_category: &BTreeMap<&str, Vec<NaiveDate>>) -> CheckResult {
        let mut duplicates = Vec::new();
        for (category, dates) in by_category {
            let mut sorted = dates.clone();
            sorted.sort();
            for w in sorted.windows(2) {
                if w[0] == w[1] {
                    duplicates.push(format!("{} on {}", category, w[0]));
                }
            }
        }

        if duplicates.is_empty() {
            CheckResult::pass("unique_days", "One row per category and day")
        } else {
            CheckResult::fail(
                "unique_days",
                &format!("{} duplicate rows", duplicates.len()),
                Some(abbreviate(duplicates)),
            )
        }
    }

    fn check_continuity(&self, by_category: &BTreeMap<&str, Vec<NaiveDate>>) -> CheckResult {
        let mut gaps = Vec::new();
        for (category, dates) in by_category {
            let mut sorted = dates.clone();
            sorted.sort();
            sorted.dedup();
            for w in sorted.windows(2) {
                let gap_days = (w[1] - w[0]).num_days();
                if gap_days > 1 {
                    gaps.push(format!("{}: {} to {} ({} days)", category, w[0], w[1], gap_days));
                }
            }
        }

        if gaps.is_empty() {
            CheckResult::pass("date_continuity", "No missing days")
        } else {
            CheckResult::fail(
                "date_continuity",
                &format!("{} gaps found", gaps.len()),
                Some(abbreviate(gaps)),
            )
        }
    }

    fn check_counts(&self, rows: &[DailyCount]) -> CheckResult {
        let negative = rows.iter().filter(|r| r.count < 0).count();
        if negative == 0 {
            CheckResult::pass("non_negative_counts", "All counts >= 0")
        } else {
            CheckResult::fail(
                "non_negative_counts",
                &format!("{} rows with negative counts", negative),
                None,
            )
        }
    }
}

fn abbreviate(items: impl IntoIterator<Item = String>) -> String {
    let items: Vec<String> = items.into_iter().collect();
    let mut shown = items
        .iter()
        .take(MAX_DETAILS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > MAX_DETAILS {
        shown.push_str(&format!(" (+{} more)", items.len() - MAX_DETAILS));
    }
    shown
}
