//! Type definitions for Aave v2 subgraph responses and derived summaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Standard GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// Protocol-wide reserve descriptor. Big integers stay as the subgraph's
/// strings; scaling happens in the summary math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reserve {
    pub id: String,
    pub underlying_asset: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub usage_as_collateral_enabled: bool,
    /// Basis points
    #[serde(rename = "baseLTVasCollateral")]
    pub base_ltv_as_collateral: String,
    /// Basis points
    pub reserve_liquidation_threshold: String,
    /// Ray
    pub liquidity_index: String,
    /// Ray, annual
    pub liquidity_rate: String,
    /// Ray
    pub variable_borrow_index: String,
    /// Ray, annual
    pub variable_borrow_rate: String,
    pub price: ReservePrice,
    pub last_update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservePrice {
    /// Wei of ETH per whole token
    pub price_in_eth: String,
}

/// One account's position in one reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReserve {
    #[serde(rename = "scaledATokenBalance")]
    pub scaled_a_token_balance: String,
    pub reserve: UserReserveRef,
    pub usage_as_collateral_enabled_on_user: bool,
    pub scaled_variable_debt: String,
    pub principal_stable_debt: String,
    /// Ray, annual
    pub stable_borrow_rate: String,
    pub stable_borrow_last_update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReserveRef {
    pub id: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Reference price of one USD in ETH, valid at fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSample {
    pub eth_per_usd: Decimal,
}

/// Rates of every reserve as of one instant, straight from the subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub at: DateTime<Utc>,
    pub rates: Vec<ReserveRate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReserveRate {
    pub reserve_id: String,
    pub liquidity_rate: Decimal,
    pub variable_borrow_rate: Decimal,
}

/// Aggregate account position produced by the summary math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    #[serde(rename = "totalLiquidityETH")]
    pub total_liquidity_eth: Decimal,
    #[serde(rename = "totalLiquidityUSD")]
    pub total_liquidity_usd: Decimal,
    #[serde(rename = "totalCollateralETH")]
    pub total_collateral_eth: Decimal,
    #[serde(rename = "totalCollateralUSD")]
    pub total_collateral_usd: Decimal,
    #[serde(rename = "totalBorrowsETH")]
    pub total_borrows_eth: Decimal,
    #[serde(rename = "totalBorrowsUSD")]
    pub total_borrows_usd: Decimal,
    /// Collateral-weighted maximum LTV, as reported; not checked against 1
    #[serde(rename = "currentLoanToValue")]
    pub current_loan_to_value: Decimal,
    #[serde(rename = "currentLiquidationThreshold")]
    pub current_liquidation_threshold: Decimal,
    /// `-1` when the account has no borrows
    #[serde(rename = "healthFactor")]
    pub health_factor: Decimal,
}

// Query payload shapes

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReservesData {
    pub reserves: Vec<Reserve>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserReservesData {
    pub user_reserves: Vec<UserReserve>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceOracleData {
    pub price_oracle: Option<PriceOracle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PriceOracle {
    pub usd_price_eth: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateHistoryData {
    pub reserves: Vec<ReserveRateHistory>,
}

/// One reserve with at most its newest history item as of the query instant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReserveRateHistory {
    pub id: String,
    #[serde(default)]
    pub params_history: Vec<RateHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RateHistoryItem {
    pub liquidity_rate: String,
    pub variable_borrow_rate: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_reserve() {
        let json = r#"{
            "id": "0x7ceb23fd6bc0add59e62ac25578270cff1b9f6190xd05e3e715d945b59290df0ae8ef85c1bdb684744",
            "underlyingAsset": "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619",
            "name": "Wrapped Ether",
            "symbol": "WETH",
            "decimals": 18,
            "usageAsCollateralEnabled": true,
            "baseLTVasCollateral": "8000",
            "reserveLiquidationThreshold": "8250",
            "liquidityIndex": "1002000000000000000000000000",
            "liquidityRate": "1500000000000000000000000",
            "variableBorrowIndex": "1010000000000000000000000000",
            "variableBorrowRate": "25000000000000000000000000",
            "price": { "priceInEth": "1000000000000000000" },
            "lastUpdateTimestamp": 1620000000
        }"#;

        let reserve: Reserve = serde_json::from_str(json).unwrap();
        assert_eq!(reserve.symbol, "WETH");
        assert_eq!(reserve.base_ltv_as_collateral, "8000");
        assert_eq!(reserve.price.price_in_eth, "1000000000000000000");
    }

    #[test]
    fn test_summary_serializes_in_declared_order() {
        let summary = PositionSummary {
            total_liquidity_eth: dec!(1),
            total_liquidity_usd: dec!(2),
            total_collateral_eth: dec!(3),
            total_collateral_usd: dec!(4),
            total_borrows_eth: dec!(5),
            total_borrows_usd: dec!(6),
            current_loan_to_value: dec!(0.75),
            current_liquidation_threshold: dec!(0.8),
            health_factor: dec!(2.0),
        };

        let json = serde_json::to_string(&summary).unwrap();
        let liquidity = json.find("totalLiquidityETH").unwrap();
        let health = json.find("healthFactor").unwrap();
        assert!(liquidity < health);
        assert!(json.contains(r#""healthFactor":"2.0""#));
    }
}
