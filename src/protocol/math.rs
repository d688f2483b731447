//! Aave v2 account summary math.
//!
//! Turns the raw reserve catalog, one account's reserves and the ETH/USD
//! reference price into totals, weighted risk parameters and a health factor
//! as of a given second.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::types::{PositionSummary, PriceSample, Reserve, UserReserve};
use crate::errors::ReportError;
use crate::utils::decimal::{from_basis_points, ray_to_decimal, scaled_decimal, weighted_average};

const SECONDS_PER_YEAR: Decimal = dec!(31536000);

/// Health factor reported for an account without borrows.
pub const NO_BORROWS_HEALTH: Decimal = dec!(-1);

/// Domain math seam: the reports only depend on this signature.
pub trait SummaryCalculator: Send + Sync {
    fn summarize(
        &self,
        reserves: &[Reserve],
        user_reserves: &[UserReserve],
        price: &PriceSample,
        now_secs: i64,
    ) -> Result<PositionSummary, ReportError>;
}

/// Aave v2 summary rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AaveV2Math;

/// `1 + rate * dt / year`
fn linear_interest(rate: Decimal, elapsed_secs: i64) -> Decimal {
    Decimal::ONE + rate * Decimal::from(elapsed_secs.max(0)) / SECONDS_PER_YEAR
}

/// Third-order binomial approximation of per-second compounding.
fn compounded_interest(rate: Decimal, elapsed_secs: i64) -> Decimal {
    if elapsed_secs <= 0 {
        return Decimal::ONE;
    }
    let per_second = rate / SECONDS_PER_YEAR;
    let exp = Decimal::from(elapsed_secs);
    let exp_minus_one = Decimal::from(elapsed_secs - 1);
    let exp_minus_two = Decimal::from((elapsed_secs - 2).max(0));

    let first = exp * per_second;
    let second = first * (exp_minus_one * per_second) / dec!(2);
    let third = first * (exp_minus_one * per_second) * (exp_minus_two * per_second) / dec!(6);

    Decimal::ONE + first + second + third
}

struct ReserveTotals {
    liquidity_eth: Decimal,
    collateral_eth: Decimal,
    borrows_eth: Decimal,
    ltv: Decimal,
    liquidation_threshold: Decimal,
}

fn reserve_totals(
    reserve: &Reserve,
    user: &UserReserve,
    now_secs: i64,
) -> Result<ReserveTotals, ReportError> {
    let decimals = reserve.decimals;
    let price_eth = scaled_decimal(&reserve.price.price_in_eth, 18)?;

    let income = ray_to_decimal(&reserve.liquidity_index)?
        * linear_interest(
            ray_to_decimal(&reserve.liquidity_rate)?,
            now_secs - reserve.last_update_timestamp,
        );
    let underlying = scaled_decimal(&user.scaled_a_token_balance, decimals)? * income;

    let variable_index = ray_to_decimal(&reserve.variable_borrow_index)?
        * compounded_interest(
            ray_to_decimal(&reserve.variable_borrow_rate)?,
            now_secs - reserve.last_update_timestamp,
        );
    let variable_debt = scaled_decimal(&user.scaled_variable_debt, decimals)? * variable_index;
    let stable_debt = scaled_decimal(&user.principal_stable_debt, decimals)?
        * compounded_interest(
            ray_to_decimal(&user.stable_borrow_rate)?,
            now_secs - user.stable_borrow_last_update_timestamp,
        );

    let liquidity_eth = underlying * price_eth;
    let is_collateral = reserve.usage_as_collateral_enabled
        && user.usage_as_collateral_enabled_on_user
        && liquidity_eth > Decimal::ZERO;

    Ok(ReserveTotals {
        liquidity_eth,
        collateral_eth: if is_collateral { liquidity_eth } else { Decimal::ZERO },
        borrows_eth: (variable_debt + stable_debt) * price_eth,
        ltv: from_basis_points(scaled_decimal(&reserve.base_ltv_as_collateral, 0)?),
        liquidation_threshold: from_basis_points(scaled_decimal(
            &reserve.reserve_liquidation_threshold,
            0,
        )?),
    })
}

impl SummaryCalculator for AaveV2Math {
    fn summarize(
        &self,
        reserves: &[Reserve],
        user_reserves: &[UserReserve],
        price: &PriceSample,
        now_secs: i64,
    ) -> Result<PositionSummary, ReportError> {
        if price.eth_per_usd <= Decimal::ZERO {
            return Err(ReportError::shape(format!(
                "ETH/USD reference price must be positive, got {}",
                price.eth_per_usd
            )));
        }

        let catalog: HashMap<&str, &Reserve> =
            reserves.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut liquidity = Decimal::ZERO;
        let mut collateral = Decimal::ZERO;
        let mut borrows = Decimal::ZERO;
        let mut ltv_weights = Vec::new();
        let mut threshold_weights = Vec::new();

        for user in user_reserves {
            let reserve = catalog.get(user.reserve.id.as_str()).ok_or_else(|| {
                ReportError::shape(format!(
                    "user reserve {} ({}) missing from reserve catalog",
                    user.reserve.id, user.reserve.symbol
                ))
            })?;

            let totals = reserve_totals(reserve, user, now_secs)?;
            liquidity += totals.liquidity_eth;
            collateral += totals.collateral_eth;
            borrows += totals.borrows_eth;
            if totals.collateral_eth > Decimal::ZERO {
                ltv_weights.push((totals.ltv, totals.collateral_eth));
                threshold_weights.push((totals.liquidation_threshold, totals.collateral_eth));
            }
        }

        let current_loan_to_value = weighted_average(&ltv_weights);
        let current_liquidation_threshold = weighted_average(&threshold_weights);
        let health_factor = if borrows == Decimal::ZERO {
            NO_BORROWS_HEALTH
        } else {
            collateral * current_liquidation_threshold / borrows
        };
        let to_usd = |eth: Decimal| (eth / price.eth_per_usd).normalize();

        Ok(PositionSummary {
            total_liquidity_eth: liquidity.normalize(),
            total_liquidity_usd: to_usd(liquidity),
            total_collateral_eth: collateral.normalize(),
            total_collateral_usd: to_usd(collateral),
            total_borrows_eth: borrows.normalize(),
            total_borrows_usd: to_usd(borrows),
            current_loan_to_value: current_loan_to_value.normalize(),
            current_liquidation_threshold: current_liquidation_threshold.normalize(),
            health_factor: health_factor.normalize(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{ReservePrice, UserReserveRef};

    const NOW: i64 = 1_700_000_000;

    fn reserve(id: &str, symbol: &str, decimals: u32, price_in_eth: &str) -> Reserve {
        Reserve {
            id: id.to_string(),
            underlying_asset: format!("0x{}", id),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            decimals,
            usage_as_collateral_enabled: true,
            base_ltv_as_collateral: "8000".to_string(),
            reserve_liquidation_threshold: "8500".to_string(),
            liquidity_index: "1000000000000000000000000000".to_string(),
            liquidity_rate: "0".to_string(),
            variable_borrow_index: "1000000000000000000000000000".to_string(),
            variable_borrow_rate: "0".to_string(),
            price: ReservePrice {
                price_in_eth: price_in_eth.to_string(),
            },
            last_update_timestamp: NOW,
        }
    }

    fn position(reserve: &Reserve, supplied: &str, borrowed: &str) -> UserReserve {
        UserReserve {
            scaled_a_token_balance: supplied.to_string(),
            reserve: UserReserveRef {
                id: reserve.id.clone(),
                symbol: reserve.symbol.clone(),
                decimals: reserve.decimals,
            },
            usage_as_collateral_enabled_on_user: true,
            scaled_variable_debt: borrowed.to_string(),
            principal_stable_debt: "0".to_string(),
            stable_borrow_rate: "0".to_string(),
            stable_borrow_last_update_timestamp: NOW,
        }
    }

    fn price() -> PriceSample {
        // 1 USD = 0.0005 ETH
        PriceSample {
            eth_per_usd: dec!(0.0005),
        }
    }

    #[test]
    fn test_supply_and_borrow_summary() {
        let weth = reserve("weth", "WETH", 18, "1000000000000000000");
        let usdc = reserve("usdc", "USDC", 6, "500000000000000");
        let users = vec![
            position(&weth, "2000000000000000000", "0"), // 2 WETH supplied
            position(&usdc, "0", "1000000000"),          // 1000 USDC borrowed
        ];

        let summary = AaveV2Math
            .summarize(&[weth, usdc], &users, &price(), NOW)
            .unwrap();

        assert_eq!(summary.total_liquidity_eth, dec!(2));
        assert_eq!(summary.total_collateral_eth, dec!(2));
        assert_eq!(summary.total_borrows_eth, dec!(0.5));
        assert_eq!(summary.total_collateral_usd, dec!(4000));
        assert_eq!(summary.total_borrows_usd, dec!(1000));
        assert_eq!(summary.current_loan_to_value, dec!(0.8));
        assert_eq!(summary.current_liquidation_threshold, dec!(0.85));
        // 2 * 0.85 / 0.5
        assert_eq!(summary.health_factor, dec!(3.4));
    }

    #[test]
    fn test_no_borrows_reports_negative_one() {
        let weth = reserve("weth", "WETH", 18, "1000000000000000000");
        let users = vec![position(&weth, "1000000000000000000", "0")];

        let summary = AaveV2Math.summarize(&[weth], &users, &price(), NOW).unwrap();
        assert_eq!(summary.health_factor, NO_BORROWS_HEALTH);
        assert_eq!(summary.total_borrows_eth, Decimal::ZERO);
    }

    #[test]
    fn test_collateral_disabled_by_user() {
        let weth = reserve("weth", "WETH", 18, "1000000000000000000");
        let mut supplied = position(&weth, "1000000000000000000", "0");
        supplied.usage_as_collateral_enabled_on_user = false;

        let summary = AaveV2Math
            .summarize(&[weth], &[supplied], &price(), NOW)
            .unwrap();
        assert_eq!(summary.total_liquidity_eth, dec!(1));
        assert_eq!(summary.total_collateral_eth, Decimal::ZERO);
        assert_eq!(summary.current_loan_to_value, Decimal::ZERO);
    }

    #[test]
    fn test_interest_accrues_since_last_update() {
        let mut weth = reserve("weth", "WETH", 18, "1000000000000000000");
        // 10% APR, one full year since the index was written
        weth.liquidity_rate = "100000000000000000000000000".to_string();
        weth.last_update_timestamp = NOW - 31_536_000;
        let users = vec![position(&weth, "1000000000000000000", "0")];

        let summary = AaveV2Math.summarize(&[weth], &users, &price(), NOW).unwrap();
        assert_eq!(summary.total_liquidity_eth, dec!(1.1));
    }

    #[test]
    fn test_unknown_reserve_is_data_shape_error() {
        let weth = reserve("weth", "WETH", 18, "1000000000000000000");
        let orphan = position(&reserve("dai", "DAI", 18, "1"), "1", "0");

        let err = AaveV2Math
            .summarize(&[weth], &[orphan], &price(), NOW)
            .unwrap_err();
        assert!(matches!(err, ReportError::DataShape(_)));
    }

    #[test]
    fn test_zero_price_rejected() {
        let err = AaveV2Math
            .summarize(&[], &[], &PriceSample { eth_per_usd: Decimal::ZERO }, NOW)
            .unwrap_err();
        assert!(matches!(err, ReportError::DataShape(_)));
    }

    #[test]
    fn test_compounded_interest_close_to_exponential() {
        // 5% over one year compounds to ~1.05127
        let factor = compounded_interest(dec!(0.05), 31_536_000);
        assert!(factor > dec!(1.0512) && factor < dec!(1.0513));
        assert_eq!(compounded_interest(dec!(0.05), 0), Decimal::ONE);
    }
}
