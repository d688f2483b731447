//! Report assembly on top of the protocol data source.
//!
//! - `fetcher`: bounded-concurrency fetches over a time series
//! - `rates`: per-instant reserve rates keyed by timestamp
//! - `position`: account summary plus the display LTV

pub mod fetcher;
pub mod position;
pub mod rates;

pub use fetcher::{BoundedFetcher, DEFAULT_CONCURRENCY};
pub use position::{display_ltv, fetch_balance, summarize_position, BalanceReport, DisplayRatio};
pub use rates::{assemble_rates, fetch_rates, RateSample, RateTable};
