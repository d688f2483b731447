use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use super::{to_csv, to_json, OutputFormat, RenderOptions, TextTable};
use crate::report::BalanceReport;
use crate::utils::{format_report_date, iso_timestamp, Trimmer};

pub const BALANCE_CSV_HEADER: [&str; 8] = [
    "timestamp",
    "symbol",
    "liquidity",
    "collateral",
    "borrows",
    "LTVMax",
    "LTV",
    "health",
];

/// Which monetary views to include. With both off only the loan rows remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denominations {
    pub usd: bool,
    pub eth: bool,
}

impl Default for Denominations {
    fn default() -> Self {
        Self {
            usd: true,
            eth: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denomination {
    Usd,
    Eth,
}

impl Denomination {
    fn symbol(self) -> &'static str {
        match self {
            Denomination::Usd => "USD",
            Denomination::Eth => "ETH",
        }
    }
}

impl Denominations {
    fn enabled(self) -> impl Iterator<Item = Denomination> {
        [
            (self.usd, Denomination::Usd),
            (self.eth, Denomination::Eth),
        ]
        .into_iter()
        .filter_map(|(on, denomination)| on.then_some(denomination))
    }
}

/// Trimmed liquidity, collateral and borrows in one denomination.
fn totals(report: &BalanceReport, denomination: Denomination, trimmer: &Trimmer) -> [String; 3] {
    let s = &report.summary;
    let values = match denomination {
        Denomination::Usd => [s.total_liquidity_usd, s.total_collateral_usd, s.total_borrows_usd],
        Denomination::Eth => [s.total_liquidity_eth, s.total_collateral_eth, s.total_borrows_eth],
    };
    values.map(|v| trimmer.trim(v))
}

#[derive(Serialize)]
struct BalanceRecord {
    timestamp: String,
    symbol: &'static str,
    liquidity: String,
    collateral: String,
    borrows: String,
    #[serde(rename = "LTVMax")]
    ltv_max: String,
    #[serde(rename = "LTV")]
    ltv: String,
    health: String,
}

pub fn render_balance(
    report: &BalanceReport,
    denominations: Denominations,
    options: &RenderOptions,
) -> Result<String> {
    let trimmer = &options.trimmer;
    let ltv_max = trimmer.trim(report.summary.current_loan_to_value);
    let ltv = trimmer.trim(report.ltv);
    let health = trimmer.trim(report.summary.health_factor);

    match options.format {
        OutputFormat::Table => {
            let mut table = TextTable::new([
                format_report_date(report.generated_at).as_str(),
                "Coin",
                "Amount",
            ]);
            for denomination in denominations.enabled() {
                let [liquidity, collateral, borrows] = totals(report, denomination, trimmer);
                table.push(["Liquidity", denomination.symbol(), liquidity.as_str()]);
                table.push(["Collateral", denomination.symbol(), collateral.as_str()]);
                table.push(["Borrows", denomination.symbol(), borrows.as_str()]);
            }
            table.push(["Loans", "LTV max", ltv_max.as_str()]);
            table.push(["", "LTV", ltv.as_str()]);
            table.push(["", "Health", health.as_str()]);
            Ok(table.to_string())
        }
        OutputFormat::Csv => {
            let timestamp = iso_timestamp(report.generated_at);
            let records: Vec<BalanceRecord> = denominations
                .enabled()
                .map(|denomination| {
                    let [liquidity, collateral, borrows] = totals(report, denomination, trimmer);
                    BalanceRecord {
                        timestamp: timestamp.clone(),
                        symbol: denomination.symbol(),
                        liquidity,
                        collateral,
                        borrows,
                        ltv_max: ltv_max.clone(),
                        ltv: ltv.clone(),
                        health: health.clone(),
                    }
                })
                .collect();
            to_csv(&BALANCE_CSV_HEADER, &records, options.header)
        }
        OutputFormat::Json => to_json(&report.summary),
        OutputFormat::Org => {
            let mut out = format!("* AAVE {}", format_report_date(report.generated_at));
            for denomination in denominations.enabled() {
                let symbol = denomination.symbol();
                let [liquidity, collateral, borrows] = totals(report, denomination, trimmer);
                write!(out, "\n  - Liquidity {}: {}", symbol, liquidity)?;
                write!(out, "\n  - Collateral {}: {}", symbol, collateral)?;
                write!(out, "\n  - Borrows {}: {}", symbol, borrows)?;
            }
            write!(out, "\n  - LTV: {}\n  - Health: {}", ltv, health)?;
            Ok(out)
        }
    }
}
