//! Walk-forward fold generation.
//!
//! Generates train/validate/test windows that advance in fixed week steps.
//! Every fold reuses the same train length (`test_start - train_start - 5w`),
//! a 3-week validation window one week after training, and a 4-week test
//! window directly after validation.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Weeks each fold advances over the previous one.
pub const DEFAULT_STEP_WEEKS: i64 = 4;

/// Largest accepted fold step, ten years.
pub const MAX_STEP_WEEKS: i64 = 520;

/// A single walk-forward fold with train/validate/test boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Fold index (0-indexed).
    pub fold: usize,
    /// Training start date.
    pub train_start: NaiveDate,
    /// Training end date.
    pub train_end: NaiveDate,
    /// Validation start date.
    pub valid_start: NaiveDate,
    /// Validation end date.
    pub valid_end: NaiveDate,
    /// Test start date.
    pub test_start: NaiveDate,
    /// Test end date.
    pub test_end: NaiveDate,
}

impl DateWindow {
    /// Get training period length in days.
    pub fn train_days(&self) -> i64 {
        (self.train_end - self.train_start).num_days()
    }

    /// Get validation period length in days.
    pub fn valid_days(&self) -> i64 {
        (self.valid_end - self.valid_start).num_days()
    }

    /// Get test period length in days.
    pub fn test_days(&self) -> i64 {
        (self.test_end - self.test_start).num_days()
    }

    /// Get total fold length in days.
    pub fn total_days(&self) -> i64 {
        (self.test_end - self.train_start).num_days()
    }

    /// True when every boundary is strictly after the previous one.
    pub fn is_well_ordered(&self) -> bool {
        self.train_start < self.train_end
            && self.train_end < self.valid_start
            && self.valid_start < self.valid_end
            && self.valid_end < self.test_start
            && self.test_start < self.test_end
    }
}

/// Generate the fold schedule for one experiment.
///
/// Folds are emitted until the first one whose `test_end` reaches or passes
/// `test_end`; that fold is included, and at least one fold is returned
/// whenever its dates fit the calendar. Generation also stops at the first
/// fold that would fall outside chrono's date range. Inputs are not
/// validated: a `test_start` too close to `train_start` yields inverted train
/// windows.
pub fn generate_folds(
    train_start: NaiveDate,
    test_start: NaiveDate,
    test_end: NaiveDate,
    step_weeks: i64,
) -> Vec<DateWindow> {
    let mut folds = Vec::new();
    let mut fold = 0usize;

    while let Some(window) = fold_window(fold, train_start, test_start, step_weeks) {
        folds.push(window);

        // A non-positive step would never reach test_end
        if window.test_end >= test_end || step_weeks <= 0 {
            break;
        }
        fold += 1;
    }

    folds
}

/// Boundaries of fold `fold`, or `None` when a date is out of range.
fn fold_window(
    fold: usize,
    train_start: NaiveDate,
    test_start: NaiveDate,
    step_weeks: i64,
) -> Option<DateWindow> {
    let offset = i64::try_from(fold)
        .ok()
        .and_then(|fold| step_weeks.checked_mul(fold))
        .and_then(Duration::try_weeks)?;
    let fold_test_start = test_start.checked_add_signed(offset)?;
    let from_test_start = |weeks: i64| fold_test_start.checked_add_signed(Duration::weeks(weeks));

    Some(DateWindow {
        fold,
        train_start: train_start.checked_add_signed(offset)?,
        train_end: from_test_start(-5)?,
        valid_start: from_test_start(-4)?,
        valid_end: from_test_start(-1)?,
        test_start: fold_test_start,
        test_end: from_test_start(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_fold_example() {
        let folds = generate_folds(
            date(2009, 1, 17),
            date(2011, 1, 8),
            date(2011, 1, 29),
            DEFAULT_STEP_WEEKS,
        );

        assert_eq!(folds.len(), 1);
        let first = folds[0];
        assert_eq!(first.fold, 0);
        assert_eq!(first.train_start, date(2009, 1, 17));
        assert_eq!(first.train_end, date(2010, 12, 4));
        assert_eq!(first.valid_start, date(2010, 12, 11));
        assert_eq!(first.valid_end, date(2011, 1, 1));
        assert_eq!(first.test_start, date(2011, 1, 8));
        assert_eq!(first.test_end, date(2011, 1, 29));
    }

    #[test]
    fn test_second_fold_shifts_by_four_weeks() {
        let folds = generate_folds(
            date(2009, 1, 17),
            date(2011, 1, 8),
            date(2011, 12, 31),
            DEFAULT_STEP_WEEKS,
        );

        let second = folds[1];
        assert_eq!(second.train_start, date(2009, 2, 14));
        assert_eq!(second.train_end, date(2011, 1, 1));
        assert_eq!(second.valid_start, date(2011, 1, 8));
        assert_eq!(second.valid_end, date(2011, 1, 29));
        assert_eq!(second.test_start, date(2011, 2, 5));
        assert_eq!(second.test_end, date(2011, 2, 26));
    }

    #[test]
    fn test_fold_schedule_properties() {
        let test_end = date(2011, 12, 31);
        let folds = generate_folds(date(2009, 1, 17), date(2011, 1, 8), test_end, 4);

        for fold in &folds {
            assert!(fold.is_well_ordered(), "fold {} out of order", fold.fold);
            assert_eq!(fold.valid_days(), 21);
            assert_eq!(fold.test_days(), 21);
        }
        for pair in folds.windows(2) {
            assert_eq!(pair[1].test_start, pair[0].test_start + Duration::weeks(4));
            assert_eq!(pair[1].train_days(), pair[0].train_days());
            assert!(pair[0].test_end < test_end);
        }

        let last = folds.last().unwrap();
        assert!(last.test_end >= test_end);
        assert_eq!(folds.len(), 13);
    }

    #[test]
    fn test_always_emits_one_fold() {
        // First fold already ends past the requested test_end
        let folds = generate_folds(date(2020, 1, 4), date(2020, 6, 6), date(2020, 6, 7), 4);
        assert_eq!(folds.len(), 1);
        assert!(folds[0].test_end > date(2020, 6, 7));
    }

    #[test]
    fn test_degenerate_gap_is_not_rejected() {
        let folds = generate_folds(date(2020, 1, 4), date(2020, 1, 25), date(2020, 2, 1), 4);
        assert_eq!(folds.len(), 1);
        assert!(folds[0].train_end < folds[0].train_start);
        assert!(!folds[0].is_well_ordered());
    }

    #[test]
    fn test_huge_step_stops_at_calendar_edge() {
        let folds = generate_folds(date(2020, 1, 4), date(2021, 1, 2), date(2030, 1, 5), i64::MAX);
        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].test_start, date(2021, 1, 2));

        let folds = generate_folds(date(2020, 1, 4), date(2021, 1, 2), NaiveDate::MAX, 1_000_000);
        assert!(!folds.is_empty());
        assert!(folds.iter().all(DateWindow::is_well_ordered));
    }

    #[test]
    fn test_first_fold_outside_calendar() {
        let folds = generate_folds(NaiveDate::MIN, NaiveDate::MIN, NaiveDate::MAX, 4);
        assert!(folds.is_empty());
    }

    #[test]
    fn test_fold_days() {
        let fold = DateWindow {
            fold: 0,
            train_start: date(2009, 1, 17),
            train_end: date(2010, 12, 4),
            valid_start: date(2010, 12, 11),
            valid_end: date(2011, 1, 1),
            test_start: date(2011, 1, 8),
            test_end: date(2011, 1, 29),
        };

        assert_eq!(fold.train_days(), 686);
        assert_eq!(fold.total_days(), 742);
    }
}
