//! Account position summary and the derived LTV display ratio.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, instrument};

use crate::protocol::{
    LendingDataSource, PositionSummary, PriceSample, Reserve, SummaryCalculator, UserReserve,
};

/// Result of dividing two decimals, with division by zero kept as a value.
///
/// A zero health factor is a legitimate protocol state, so the LTV derived
/// from it is displayed rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRatio {
    Finite(Decimal),
    PositiveInfinity,
    NegativeInfinity,
    /// `0 / 0`
    Undefined,
}

impl DisplayRatio {
    pub fn divide(numerator: Decimal, denominator: Decimal) -> Self {
        if denominator.is_zero() {
            return if numerator.is_zero() {
                DisplayRatio::Undefined
            } else if numerator.is_sign_negative() {
                DisplayRatio::NegativeInfinity
            } else {
                DisplayRatio::PositiveInfinity
            };
        }

        match numerator.checked_div(denominator) {
            Some(ratio) => DisplayRatio::Finite(ratio.normalize()),
            None if numerator.is_sign_negative() != denominator.is_sign_negative() => {
                DisplayRatio::NegativeInfinity
            }
            None => DisplayRatio::PositiveInfinity,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DisplayRatio::Finite(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayRatio::Finite(value) => write!(f, "{}", value),
            DisplayRatio::PositiveInfinity => write!(f, "Infinity"),
            DisplayRatio::NegativeInfinity => write!(f, "-Infinity"),
            DisplayRatio::Undefined => write!(f, "NaN"),
        }
    }
}

impl Serialize for DisplayRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The display LTV: liquidation threshold over health factor.
///
/// Not the same quantity as `current_loan_to_value`.
pub fn display_ltv(summary: &PositionSummary) -> DisplayRatio {
    DisplayRatio::divide(
        summary.current_liquidation_threshold,
        summary.health_factor,
    )
}

/// Everything the balance renderers need.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub summary: PositionSummary,
    pub ltv: DisplayRatio,
    pub generated_at: DateTime<Utc>,
}

impl BalanceReport {
    pub fn new(summary: PositionSummary, generated_at: DateTime<Utc>) -> Self {
        let ltv = display_ltv(&summary);
        Self {
            summary,
            ltv,
            generated_at,
        }
    }
}

/// Join the three independent views into one report as of `now`.
pub fn summarize_position(
    calculator: &dyn SummaryCalculator,
    reserves: &[Reserve],
    user_reserves: &[UserReserve],
    price: &PriceSample,
    now: DateTime<Utc>,
) -> Result<BalanceReport> {
    let summary = calculator
        .summarize(reserves, user_reserves, price, now.timestamp())
        .context("Failed to summarize account position")?;
    Ok(BalanceReport::new(summary, now))
}

/// Fetch reserves, account reserves and price concurrently, then summarize.
#[instrument(skip(source, calculator))]
pub async fn fetch_balance(
    source: &dyn LendingDataSource,
    calculator: &dyn SummaryCalculator,
    address: &str,
    now: DateTime<Utc>,
) -> Result<BalanceReport> {
    let (reserves, user_reserves, price) = tokio::try_join!(
        source.get_reserves(),
        source.get_user_reserves(address),
        source.get_eth_price(),
    )?;

    debug!(
        "Fetched {} reserves, {} user reserves",
        reserves.len(),
        user_reserves.len()
    );

    summarize_position(calculator, &reserves, &user_reserves, &price, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReportError;
    use crate::protocol::MockLendingDataSource;
    use rust_decimal_macros::dec;

    fn summary(threshold: Decimal, health: Decimal) -> PositionSummary {
        PositionSummary {
            total_liquidity_eth: dec!(0.5),
            total_liquidity_usd: dec!(1000.456),
            total_collateral_eth: dec!(0.4),
            total_collateral_usd: dec!(800.1),
            total_borrows_eth: dec!(0.1),
            total_borrows_usd: dec!(200.0),
            current_loan_to_value: dec!(0.75),
            current_liquidation_threshold: threshold,
            health_factor: health,
        }
    }

    struct FixedSummary(PositionSummary);

    impl SummaryCalculator for FixedSummary {
        fn summarize(
            &self,
            _reserves: &[Reserve],
            _user_reserves: &[UserReserve],
            _price: &PriceSample,
            _now_secs: i64,
        ) -> Result<PositionSummary, ReportError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_ltv_is_threshold_over_health() {
        let ltv = display_ltv(&summary(dec!(0.8), dec!(2.0)));
        assert_eq!(ltv, DisplayRatio::Finite(dec!(0.4)));
        assert_eq!(ltv.to_string(), "0.4");
    }

    #[test]
    fn test_ltv_is_not_loan_to_value() {
        let s = summary(dec!(0.8), dec!(1.6));
        assert_eq!(display_ltv(&s).as_decimal(), Some(dec!(0.5)));
        assert_ne!(display_ltv(&s).as_decimal(), Some(s.current_loan_to_value));
    }

    #[test]
    fn test_zero_health_is_non_finite_not_error() {
        assert_eq!(
            display_ltv(&summary(dec!(0.8), Decimal::ZERO)),
            DisplayRatio::PositiveInfinity
        );
        assert_eq!(
            display_ltv(&summary(Decimal::ZERO, Decimal::ZERO)),
            DisplayRatio::Undefined
        );
        assert_eq!(DisplayRatio::PositiveInfinity.to_string(), "Infinity");
        assert_eq!(DisplayRatio::Undefined.to_string(), "NaN");
        assert_eq!(
            DisplayRatio::divide(dec!(-1), Decimal::ZERO).to_string(),
            "-Infinity"
        );
    }

    #[test]
    fn test_no_borrow_health_gives_negative_ltv() {
        let ltv = display_ltv(&summary(dec!(0.8), dec!(-1)));
        assert_eq!(ltv.to_string(), "-0.8");
    }

    #[test]
    fn test_display_ratio_serializes_as_string() {
        let json = serde_json::to_string(&DisplayRatio::Finite(dec!(0.25))).unwrap();
        assert_eq!(json, r#""0.25""#);
        let json = serde_json::to_string(&DisplayRatio::PositiveInfinity).unwrap();
        assert_eq!(json, r#""Infinity""#);
    }

    #[tokio::test]
    async fn test_fetch_balance_joins_three_views() {
        let mut source = MockLendingDataSource::new();
        source.expect_get_reserves().times(1).returning(|| Ok(vec![]));
        source
            .expect_get_user_reserves()
            .withf(|address| address == "0xabc")
            .times(1)
            .returning(|_| Ok(vec![]));
        source.expect_get_eth_price().times(1).returning(|| {
            Ok(PriceSample {
                eth_per_usd: dec!(0.0005),
            })
        });

        let now = Utc::now();
        let report = fetch_balance(
            &source,
            &FixedSummary(summary(dec!(0.8), dec!(2.0))),
            "0xabc",
            now,
        )
        .await
        .unwrap();

        assert_eq!(report.generated_at, now);
        assert_eq!(report.ltv, DisplayRatio::Finite(dec!(0.4)));
    }

    #[tokio::test]
    async fn test_fetch_balance_fails_on_any_fetch_error() {
        let mut source = MockLendingDataSource::new();
        source.expect_get_reserves().returning(|| Ok(vec![]));
        source
            .expect_get_user_reserves()
            .returning(|_| Err(anyhow::anyhow!("subgraph down")));
        source.expect_get_eth_price().returning(|| {
            Ok(PriceSample {
                eth_per_usd: dec!(0.0005),
            })
        });

        let err = fetch_balance(
            &source,
            &FixedSummary(summary(dec!(0.8), dec!(2.0))),
            "0xabc",
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("subgraph down"));
    }
}
