pub mod loader;
pub mod types;

pub use loader::{LoaderError, OrderTablesLoader, TableFiles};
pub use types::{
    column_dates, date_from_days, date_series, datetime_expr, days_from_date,
    frame_to_daily_counts, parse_day, ColumnNames, DailyCount, DELIVERED_STATUS,
};
