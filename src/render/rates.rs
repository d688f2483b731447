use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use super::{to_csv, to_json, OutputFormat, RenderOptions, TextTable};
use crate::report::{RateSample, RateTable};
use crate::utils::format_report_date;

pub const RATES_CSV_HEADER: [&str; 4] = ["timestamp", "symbol", "liquidityRate", "variableBorrowRate"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RateRecord<'a> {
    timestamp: &'a str,
    symbol: &'a str,
    liquidity_rate: String,
    variable_borrow_rate: String,
}

fn samples(table: &RateTable) -> impl Iterator<Item = (&str, &RateSample)> {
    table
        .iter()
        .flat_map(|(timestamp, samples)| samples.iter().map(move |s| (timestamp.as_str(), s)))
}

pub fn render_rates(
    rates: &RateTable,
    generated_at: DateTime<Utc>,
    options: &RenderOptions,
) -> Result<String> {
    let trimmer = &options.trimmer;

    match options.format {
        OutputFormat::Table => {
            let mut table = TextTable::new(["Date", "Coin", "Deposit rate", "Lend rate"]);
            for (timestamp, sample) in samples(rates) {
                table.push([
                    timestamp.to_string(),
                    sample.symbol.clone(),
                    trimmer.trim(sample.liquidity_rate),
                    trimmer.trim(sample.variable_borrow_rate),
                ]);
            }
            Ok(table.to_string())
        }
        OutputFormat::Csv => {
            let records: Vec<RateRecord> = samples(rates)
                .map(|(timestamp, sample)| RateRecord {
                    timestamp,
                    symbol: &sample.symbol,
                    liquidity_rate: trimmer.trim(sample.liquidity_rate),
                    variable_borrow_rate: trimmer.trim(sample.variable_borrow_rate),
                })
                .collect();
            to_csv(&RATES_CSV_HEADER, &records, options.header)
        }
        OutputFormat::Json => to_json(rates),
        OutputFormat::Org => {
            let mut out = format!("* AAVE Rates {}", format_report_date(generated_at));
            for (timestamp, sample) in samples(rates) {
                write!(
                    out,
                    "\n  - {} {}: Deposit {}, Lend {}",
                    timestamp,
                    sample.symbol,
                    trimmer.trim(sample.liquidity_rate),
                    trimmer.trim(sample.variable_borrow_rate)
                )?;
            }
            Ok(out)
        }
    }
}
