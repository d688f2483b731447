//! Lending protocol integration (Aave v2 via its subgraph).
//!
//! ## Data
//! - Reserve catalog, account reserves and the ETH/USD reference price
//! - Historical reserve rates
//!
//! ## Math
//! - Account summary: totals in ETH and USD, weighted LTV and liquidation
//!   threshold, health factor

mod client;
pub mod math;
mod types;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use client::AaveClient;
pub use math::{AaveV2Math, SummaryCalculator};
pub use types::*;

/// Remote reads the lending reports are built from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingDataSource: Send + Sync {
    /// Protocol-wide reserve catalog.
    async fn get_reserves(&self) -> Result<Vec<Reserve>>;

    /// Every reserve position held by `address`.
    async fn get_user_reserves(&self, address: &str) -> Result<Vec<UserReserve>>;

    /// Current ETH/USD reference price.
    async fn get_eth_price(&self) -> Result<PriceSample>;

    /// Reserve rates as of `at`.
    async fn get_rate_snapshot(&self, at: DateTime<Utc>) -> Result<RateSnapshot>;
}
