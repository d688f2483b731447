use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::io::Write;
use tracing::{debug, instrument};

use super::CommonArgs;
use crate::config::Config;
use crate::errors::ReportError;
use crate::protocol::{AaveClient, LendingDataSource};
use crate::render::{render_rates, RenderOptions};
use crate::report::{fetch_rates, BoundedFetcher};
use crate::utils::{StepUnit, TimeSeries};

/// `rates` command flags.
#[derive(Debug, Clone, Args)]
pub struct RatesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of samples to retrieve, ending now
    #[arg(long, default_value_t = 1)]
    pub days: usize,

    /// Space samples an hour apart instead of a day
    #[arg(long)]
    pub hours: bool,
}

impl RatesArgs {
    fn unit(&self) -> StepUnit {
        if self.hours {
            StepUnit::Hour
        } else {
            StepUnit::Day
        }
    }
}

pub async fn run_rates<W: Write>(args: &RatesArgs, config: &Config, out: &mut W) -> Result<()> {
    if args.days == 0 {
        return Err(ReportError::invalid("days", "must be at least 1").into());
    }
    let series = TimeSeries::ending_at(Utc::now(), args.unit(), args.days).ok_or_else(|| {
        ReportError::invalid("days", format!("{} samples reach outside the calendar", args.days))
    })?;

    let network = config.network(&args.common.network)?;
    let source = AaveClient::new(&network.subgraph_url, config.http.timeout())?;
    let fetcher = BoundedFetcher::new(config.rates.concurrency);

    report_rates(&source, &fetcher, series, &args.common.render_options(), out).await
}

#[instrument(skip_all, fields(samples = series.len()))]
async fn report_rates<W: Write>(
    source: &dyn LendingDataSource,
    fetcher: &BoundedFetcher,
    series: TimeSeries,
    options: &RenderOptions,
    out: &mut W,
) -> Result<()> {
    let rates = fetch_rates(source, fetcher, series).await?;
    debug!("Rate table has {} instants", rates.len());

    let rendered = render_rates(&rates, Utc::now(), options)?;
    writeln!(out, "{}", rendered)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MockLendingDataSource, RateSnapshot, ReserveRate};
    use crate::render::OutputFormat;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn catalog_reserve() -> crate::protocol::Reserve {
        serde_json::from_value(serde_json::json!({
            "id": "0xweth",
            "underlyingAsset": "0xweth",
            "name": "Wrapped Ether",
            "symbol": "WETH",
            "decimals": 18,
            "usageAsCollateralEnabled": true,
            "baseLTVasCollateral": "8000",
            "reserveLiquidationThreshold": "8250",
            "liquidityIndex": "1000000000000000000000000000",
            "liquidityRate": "0",
            "variableBorrowIndex": "1000000000000000000000000000",
            "variableBorrowRate": "0",
            "price": { "priceInEth": "1000000000000000000" },
            "lastUpdateTimestamp": 1700000000
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_rates_csv_over_hourly_series() {
        let mut source = MockLendingDataSource::new();
        source
            .expect_get_reserves()
            .returning(|| Ok(vec![catalog_reserve()]));
        source.expect_get_rate_snapshot().times(2).returning(|at| {
            Ok(RateSnapshot {
                at,
                rates: vec![ReserveRate {
                    reserve_id: "0xweth".to_string(),
                    liquidity_rate: dec!(0.00123),
                    variable_borrow_rate: dec!(0.0456),
                }],
            })
        });

        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let series = TimeSeries::ending_at(end, StepUnit::Hour, 2).unwrap();
        assert_eq!(series.iter().next(), Some(end - Duration::hours(1)));

        let mut out = Vec::new();
        report_rates(
            &source,
            &BoundedFetcher::default(),
            series,
            &RenderOptions::new(OutputFormat::Csv, 3, true),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "timestamp,symbol,liquidityRate,variableBorrowRate\n\
             2024-05-01T11:00:00.000Z,WETH,0.001,0.045\n\
             2024-05-01T12:00:00.000Z,WETH,0.001,0.045\n"
        );
    }

    #[tokio::test]
    async fn test_zero_days_is_input_error() {
        let args = RatesArgs {
            common: CommonArgs {
                network: "polygon".to_string(),
                decimals: 4,
                verbose: false,
                format: OutputFormat::Table,
                noheader: false,
            },
            days: 0,
            hours: false,
        };
        let err = run_rates(&args, &Config::default(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::InvalidInput { field: "days", .. })
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_days_is_input_error() {
        let mut args = RatesArgs {
            common: CommonArgs {
                network: "polygon".to_string(),
                decimals: 4,
                verbose: false,
                format: OutputFormat::Table,
                noheader: false,
            },
            days: 100_000_000,
            hours: false,
        };
        for days in [100_000_000, usize::MAX] {
            args.days = days;
            let err = run_rates(&args, &Config::default(), &mut Vec::new())
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ReportError>(),
                Some(ReportError::InvalidInput { field: "days", .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_network_is_input_error() {
        let args = RatesArgs {
            common: CommonArgs {
                network: "fantom".to_string(),
                decimals: 4,
                verbose: false,
                format: OutputFormat::Table,
                noheader: false,
            },
            days: 1,
            hours: false,
        };
        let err = run_rates(&args, &Config::default(), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such network"));
    }
}
