//! Shared utilities: decimal trimming and scaling, time series and timestamps.

pub mod decimal;
pub mod time;

pub use decimal::{trim_decimals, Trimmer};
pub use time::{format_report_date, iso_timestamp, StepUnit, TimeSeries};
