//! Walk-forward fold module.
//!
//! Produces rolling train/validate/test windows for repeated
//! retrain-and-forecast evaluation:
//! - Train: `test_start - train_start - 5` weeks, fixed across folds
//! - Validate: 3 weeks, one week after training ends
//! - Test: 4 weeks, directly after validation
//! - Roll: every 4 weeks

pub mod periods;

pub use periods::{generate_folds, DateWindow, DEFAULT_STEP_WEEKS, MAX_STEP_WEEKS};
