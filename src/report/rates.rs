//! Joins per-instant rate snapshots with the reserve catalog.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

use super::fetcher::BoundedFetcher;
use crate::protocol::{LendingDataSource, RateSnapshot, Reserve, ReserveRate};
use crate::utils::{iso_timestamp, TimeSeries};

/// Deposit and variable borrow rate of one reserve at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSample {
    pub symbol: String,
    pub liquidity_rate: Decimal,
    pub variable_borrow_rate: Decimal,
}

/// ISO-8601 timestamp -> samples in catalog order. Keys sort chronologically.
pub type RateTable = BTreeMap<String, Vec<RateSample>>;

/// Build the rate table.
///
/// Rates come from each snapshot, never from the catalog (whose rates are
/// only as fresh as the catalog fetch). A reserve missing from a snapshot is
/// left out for that instant rather than filled with zeros.
pub fn assemble_rates(catalog: &[Reserve], snapshots: &[RateSnapshot]) -> RateTable {
    let mut table = RateTable::new();

    for snapshot in snapshots {
        let by_reserve: HashMap<&str, &ReserveRate> = snapshot
            .rates
            .iter()
            .map(|rate| (rate.reserve_id.as_str(), rate))
            .collect();

        let samples: Vec<RateSample> = catalog
            .iter()
            .filter_map(|reserve| {
                by_reserve.get(reserve.id.as_str()).map(|rate| RateSample {
                    symbol: reserve.symbol.clone(),
                    liquidity_rate: rate.liquidity_rate,
                    variable_borrow_rate: rate.variable_borrow_rate,
                })
            })
            .collect();

        if samples.len() < snapshot.rates.len() {
            debug!(
                "{} rates at {} had no catalog entry",
                snapshot.rates.len() - samples.len(),
                snapshot.at
            );
        }

        table.insert(iso_timestamp(snapshot.at), samples);
    }

    table
}

/// Fetch the catalog plus one snapshot per instant of `series`, then assemble.
#[instrument(skip(source, fetcher), fields(samples = series.len()))]
pub async fn fetch_rates(
    source: &dyn LendingDataSource,
    fetcher: &BoundedFetcher,
    series: TimeSeries,
) -> Result<RateTable> {
    let catalog = source
        .get_reserves()
        .await
        .context("Failed to fetch reserve catalog")?;

    let snapshots = fetcher
        .fetch_all(series, |at| source.get_rate_snapshot(at))
        .await?;

    info!(
        "Assembling rates for {} reserves over {} instants",
        catalog.len(),
        snapshots.len()
    );
    Ok(assemble_rates(&catalog, &snapshots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReservePrice;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn reserve(id: &str, symbol: &str) -> Reserve {
        Reserve {
            id: id.to_string(),
            underlying_asset: id.to_string(),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
            usage_as_collateral_enabled: true,
            base_ltv_as_collateral: "8000".to_string(),
            reserve_liquidation_threshold: "8500".to_string(),
            liquidity_index: "1000000000000000000000000000".to_string(),
            // Stale catalog rate, must never reach the table
            liquidity_rate: "990000000000000000000000000".to_string(),
            variable_borrow_index: "1000000000000000000000000000".to_string(),
            variable_borrow_rate: "990000000000000000000000000".to_string(),
            price: ReservePrice {
                price_in_eth: "1".to_string(),
            },
            last_update_timestamp: 0,
        }
    }

    fn rate(id: &str, deposit: Decimal, borrow: Decimal) -> ReserveRate {
        ReserveRate {
            reserve_id: id.to_string(),
            liquidity_rate: deposit,
            variable_borrow_rate: borrow,
        }
    }

    #[test]
    fn test_assemble_uses_snapshot_rates_in_catalog_order() {
        let catalog = vec![reserve("a", "WETH"), reserve("b", "USDC"), reserve("c", "DAI")];
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let snapshot = RateSnapshot {
            at,
            rates: vec![
                rate("c", dec!(0.03), dec!(0.05)),
                rate("a", dec!(0.01), dec!(0.02)),
            ],
        };

        let table = assemble_rates(&catalog, &[snapshot]);
        let samples = &table["2024-05-01T00:00:00.000Z"];

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].symbol, "WETH");
        assert_eq!(samples[0].liquidity_rate, dec!(0.01));
        assert_eq!(samples[1].symbol, "DAI");
        assert_eq!(samples[1].variable_borrow_rate, dec!(0.05));
    }

    #[test]
    fn test_missing_reserves_are_omitted_per_instant() {
        let catalog = vec![reserve("a", "WETH"), reserve("b", "USDC")];
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::days(1);
        let snapshots = vec![
            RateSnapshot {
                at: t0,
                rates: vec![rate("a", dec!(0.01), dec!(0.02))],
            },
            RateSnapshot {
                at: t1,
                rates: vec![
                    rate("a", dec!(0.011), dec!(0.021)),
                    rate("b", dec!(0.04), dec!(0.06)),
                    rate("unknown", dec!(0.5), dec!(0.5)),
                ],
            },
        ];

        let table = assemble_rates(&catalog, &snapshots);
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["2024-05-01T00:00:00.000Z", "2024-05-02T00:00:00.000Z"]
        );
        assert_eq!(table[&keys[0]].len(), 1);
        assert_eq!(table[&keys[1]].len(), 2);
        assert_eq!(table[&keys[1]][1].symbol, "USDC");
    }

    #[tokio::test]
    async fn test_fetch_rates_one_snapshot_per_instant() {
        use crate::protocol::MockLendingDataSource;
        use crate::utils::StepUnit;

        let mut source = MockLendingDataSource::new();
        source
            .expect_get_reserves()
            .times(1)
            .returning(|| Ok(vec![reserve("a", "WETH")]));
        source.expect_get_rate_snapshot().times(3).returning(|at| {
            Ok(RateSnapshot {
                at,
                rates: vec![rate("a", dec!(0.01), dec!(0.02))],
            })
        });

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let series = TimeSeries::new(start, StepUnit::Hour, 3).unwrap();
        let table = fetch_rates(&source, &BoundedFetcher::new(2), series)
            .await
            .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.contains_key("2024-05-01T02:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_fetch_rates_fails_if_any_snapshot_fails() {
        use crate::protocol::MockLendingDataSource;
        use crate::utils::StepUnit;

        let mut source = MockLendingDataSource::new();
        source.expect_get_reserves().returning(|| Ok(vec![]));
        source
            .expect_get_rate_snapshot()
            .returning(|_| Err(anyhow::anyhow!("indexer lagging")));

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let err = fetch_rates(
            &source,
            &BoundedFetcher::default(),
            TimeSeries::new(start, StepUnit::Day, 2).unwrap(),
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("indexer lagging"));
    }

    #[test]
    fn test_empty_snapshot_list() {
        let table = assemble_rates(&[reserve("a", "WETH")], &[]);
        assert!(table.is_empty());
    }
}
