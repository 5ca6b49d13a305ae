//! Whole-table scaling.
//!
//! Scalers pool every value of the selected columns into one statistic
//! instead of scaling column by column. Missing values are ignored when
//! fitting and stay missing when transforming.

pub mod scalers;

pub use scalers::{
    fit_frame, inverse_transform_frame, transform_frame, MinMaxScaler, Scaler, ScalerError,
    ScalerResult, StandardScaler,
};
