//! # defi-watch
//!
//! Command-line reports on DeFi positions: Aave v2 account solvency with a
//! health alert, historical reserve rates, and yield-farm stakes.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `protocol`: Aave v2 subgraph client and account summary math
//! - `farming`: Farm pool API client and on-chain stake reads
//! - `report`: Bounded fan-out, rate assembly and position summaries
//! - `render`: Table, CSV, JSON and org-mode output
//! - `alert`: Threshold alerts over webhooks
//! - `commands`: The `balance`, `rates` and `farming` commands
//! - `utils`: Decimal trimming and scaling, time series

pub mod alert;
pub mod commands;
pub mod config;
pub mod errors;
pub mod farming;
pub mod protocol;
pub mod render;
pub mod report;
pub mod utils;

pub use config::Config;
pub use errors::ReportError;
