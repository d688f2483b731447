//! Report rendering: text table, CSV, JSON and org-mode outline.
//!
//! Every renderer returns the whole report as one string without a trailing
//! newline; printing it is left to the caller.

mod balance;
mod csv;
mod farming;
mod rates;
mod table;

use clap::ValueEnum;
use serde::Serialize;

use crate::utils::Trimmer;

pub use self::csv::to_csv;
pub use balance::{render_balance, Denominations, BALANCE_CSV_HEADER};
pub use farming::{render_farming, FarmReport, FARMING_CSV_HEADER};
pub use rates::{render_rates, RATES_CSV_HEADER};
pub use table::TextTable;

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Org,
}

/// Settings shared by every report renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub trimmer: Trimmer,
    /// CSV only: emit the header line.
    pub header: bool,
}

impl RenderOptions {
    pub fn new(format: OutputFormat, decimals: usize, header: bool) -> Self {
        Self {
            format,
            trimmer: Trimmer::new(decimals),
            header,
        }
    }
}

/// Full-precision JSON with two-space indentation.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
