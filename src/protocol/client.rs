//! Aave v2 subgraph client.
//!
//! Issues the GraphQL queries the reports need and decodes their payloads:
//! - Reserve catalog (rates, indexes, prices, risk parameters)
//! - One account's reserves
//! - The ETH/USD oracle price
//! - Reserve rates as of a past instant

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::*;
use super::LendingDataSource;
use crate::errors::ReportError;
use crate::utils::decimal::{ray_to_decimal, scaled_decimal};

const ALL_RESERVES_QUERY: &str = r#"{
  reserves {
    id
    underlyingAsset
    name
    symbol
    decimals
    usageAsCollateralEnabled
    baseLTVasCollateral
    reserveLiquidationThreshold
    liquidityIndex
    liquidityRate
    variableBorrowIndex
    variableBorrowRate
    price {
      priceInEth
    }
    lastUpdateTimestamp
  }
}"#;

const ETH_USD_PRICE_QUERY: &str = r#"{
  priceOracle(id: "1") {
    usdPriceEth
  }
}"#;

fn user_reserves_query(address: &str) -> String {
    format!(
        r#"{{
  userReserves(where: {{ user: "{}" }}) {{
    scaledATokenBalance
    reserve {{
      id
      symbol
      decimals
    }}
    usageAsCollateralEnabledOnUser
    scaledVariableDebt
    principalStableDebt
    stableBorrowRate
    stableBorrowLastUpdateTimestamp
  }}
}}"#,
        address.to_lowercase()
    )
}

/// Newest history item per reserve at or before `at`.
///
/// Paging per reserve keeps a quiet reserve in the snapshot however many
/// updates the busy ones logged since its last one.
fn rate_history_query(at: DateTime<Utc>) -> String {
    format!(
        r#"{{
  reserves(first: 1000) {{
    id
    paramsHistory(first: 1, orderBy: timestamp, orderDirection: desc, where: {{ timestamp_lte: {} }}) {{
      liquidityRate
      variableBorrowRate
    }}
  }}
}}"#,
        at.timestamp()
    )
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

/// Subgraph client for one Aave v2 deployment.
#[derive(Debug, Clone)]
pub struct AaveClient {
    client: Client,
    api_url: String,
}

impl AaveClient {
    /// Create a client for the subgraph at `api_url`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    /// POST one query and decode its `data` object.
    async fn query<T: DeserializeOwned>(&self, name: &str, query: &str) -> Result<T> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&GraphQlRequest { query })
            .send()
            .await
            .map_err(|e| ReportError::transport("subgraph", e.to_string()))
            .with_context(|| format!("Failed to send {} query", name))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReportError::transport("subgraph", e.to_string()))
            .with_context(|| format!("Failed to read {} response", name))?;

        if !status.is_success() {
            return Err(ReportError::transport("subgraph", format!("HTTP {}: {}", status, body)))
                .with_context(|| format!("{} query rejected", name));
        }

        debug!("{} raw response:\n{}", name, body);

        let envelope: GraphQlResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ReportError::shape(format!("{}: {}", name, e)))
            .with_context(|| format!("Failed to parse {} response", name))?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(ReportError::shape(format!("{}: {}", name, messages.join("; "))).into());
        }

        envelope
            .data
            .ok_or_else(|| ReportError::shape(format!("{}: response has no data", name)).into())
    }
}

#[async_trait]
impl LendingDataSource for AaveClient {
    #[instrument(skip(self), name = "aave_get_reserves")]
    async fn get_reserves(&self) -> Result<Vec<Reserve>> {
        let data: ReservesData = self.query("getReserves", ALL_RESERVES_QUERY).await?;
        debug!("Fetched {} reserves", data.reserves.len());
        Ok(data.reserves)
    }

    #[instrument(skip(self), name = "aave_get_user_reserves")]
    async fn get_user_reserves(&self, address: &str) -> Result<Vec<UserReserve>> {
        let data: UserReservesData = self
            .query("getUserReserves", &user_reserves_query(address))
            .await?;
        debug!("Fetched {} user reserves", data.user_reserves.len());
        Ok(data.user_reserves)
    }

    #[instrument(skip(self), name = "aave_get_eth_price")]
    async fn get_eth_price(&self) -> Result<PriceSample> {
        let data: PriceOracleData = self.query("getEthPrice", ETH_USD_PRICE_QUERY).await?;
        let oracle = data
            .price_oracle
            .ok_or_else(|| ReportError::shape("getEthPrice: priceOracle is null"))?;

        Ok(PriceSample {
            eth_per_usd: scaled_decimal(&oracle.usd_price_eth, 18)?,
        })
    }

    #[instrument(skip(self), name = "aave_get_rate_snapshot")]
    async fn get_rate_snapshot(&self, at: DateTime<Utc>) -> Result<RateSnapshot> {
        let data: RateHistoryData = self
            .query("getRateSnapshot", &rate_history_query(at))
            .await?;

        // A reserve with no history yet at `at` has no rate to report.
        let mut rates = Vec::with_capacity(data.reserves.len());
        for reserve in data.reserves {
            let Some(item) = reserve.params_history.into_iter().next() else {
                continue;
            };
            rates.push(ReserveRate {
                reserve_id: reserve.id,
                liquidity_rate: ray_to_decimal(&item.liquidity_rate)?.normalize(),
                variable_borrow_rate: ray_to_decimal(&item.variable_borrow_rate)?.normalize(),
            });
        }

        debug!("Rate snapshot at {} has {} reserves", at, rates.len());
        Ok(RateSnapshot { at, rates })
    }
}
