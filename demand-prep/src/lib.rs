pub mod data;
pub mod dataset;
pub mod features;
pub mod metrics;
pub mod preprocessing;
pub mod validation;
pub mod walkforward;

// Re-export commonly used types
pub use data::{ColumnNames, DailyCount, OrderTablesLoader, TableFiles};
pub use dataset::{
    DatasetBuilder, DatasetConfig, DatasetError, DatasetSplits, ExperimentDates, FoldSplits,
    SplitData, SplitMode,
};
pub use features::{build_lag_features, build_rolling_features, FeatureError, Grouping};
pub use metrics::{ForecastMetrics, MetricsCalculator};
pub use preprocessing::{MinMaxScaler, Scaler, StandardScaler};
pub use validation::{SeriesIntegrityReport, SeriesIntegrityValidator};
pub use walkforward::{generate_folds, DateWindow};
