//! Command implementations behind the CLI.
//!
//! Each command validates its input before any remote call, builds its
//! clients from [`Config`](crate::config::Config), renders exactly one
//! report to the given writer and returns.

mod balance;
mod farming;
mod rates;

use alloy::primitives::Address;
use clap::Args;

use crate::errors::ReportError;
use crate::render::{OutputFormat, RenderOptions};

pub use balance::{report_balance, run_balance, BalanceArgs, HEALTH_WARNING};
pub use farming::{run_farming, FarmingArgs};
pub use rates::{run_rates, RatesArgs};

/// Flags every report command accepts.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Network to query
    #[arg(short, long, default_value = "polygon")]
    pub network: String,

    /// Number of decimals to display
    #[arg(long, default_value_t = 4)]
    pub decimals: usize,

    /// Log raw remote responses
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Do not output the CSV header
    #[arg(long)]
    pub noheader: bool,
}

impl CommonArgs {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new(self.format, self.decimals, !self.noheader)
    }
}

/// Parse an account address, treating a blank value as missing.
pub fn parse_address(raw: Option<&str>) -> Result<Address, ReportError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ReportError::MissingInput("address"))?;

    raw.parse()
        .map_err(|e| ReportError::invalid("address", format!("{}: {}", raw, e)))
}
