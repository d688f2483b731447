use alloy::primitives::Address;
use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument};

use super::client::FarmApiClient;
use super::staking::StakeSource;
use super::types::FarmPool;

/// Joins a farm's pool catalog with one account's stakes.
pub struct FarmingService<S> {
    pools: FarmApiClient,
    stakes: S,
}

impl<S: StakeSource> FarmingService<S> {
    pub fn new(pools: FarmApiClient, stakes: S) -> Self {
        Self { pools, stakes }
    }

    /// Every pool the account has a stake in, or every pool with `all_pools`.
    ///
    /// Stakes are read for all pools at once; the first failed read aborts
    /// the rest.
    #[instrument(skip(self), fields(user = %address))]
    pub async fn get_balances(&self, address: Address, all_pools: bool) -> Result<Vec<FarmPool>> {
        let pools = self.pools.get_pools().await?;

        let stakes = try_join_all(
            pools
                .iter()
                .map(|pool| self.stakes.get_stake(pool, address)),
        )
        .await
        .context("Failed to read pool stakes")?;

        let mut balances = Vec::new();
        for (pool, stake) in pools.into_iter().zip(stakes) {
            if !all_pools && stake.is_empty() {
                continue;
            }
            balances.push(FarmPool::from_parts(pool, stake)?);
        }

        debug!("{} pools selected", balances.len());
        info!("Read stakes for {} farm pools", balances.len());
        Ok(balances)
    }
}
