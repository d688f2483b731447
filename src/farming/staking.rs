//! On-chain stake reads from a farm's MasterChef contract.

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::types::{PoolInfo, StakeInfo};
use crate::config::NetworkConfig;
use crate::errors::ReportError;
use crate::utils::decimal::wei_to_decimal;

sol! {
    #[sol(rpc)]
    interface IMasterChef {
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
        function pendingReward(uint256 pid, address user) external view returns (uint256 pending);
    }
}

/// Where per-pool stakes come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StakeSource: Send + Sync {
    async fn get_stake(&self, pool: &PoolInfo, user: Address) -> Result<StakeInfo>;
}

/// Reads stakes over JSON-RPC.
///
/// Only obtainable through [`StakingReader::connect`], so every read happens
/// against a provider whose chain has already been verified.
#[derive(Clone, Debug)]
pub struct StakingReader {
    provider: RootProvider,
    chain_id: u64,
}

impl StakingReader {
    #[instrument(skip(network), fields(rpc = %network.rpc_url))]
    pub async fn connect(network: &NetworkConfig) -> Result<Self> {
        let url: Url = network
            .rpc_url
            .parse()
            .map_err(|e| ReportError::invalid("rpc_url", format!("{}: {}", network.rpc_url, e)))?;
        let provider = RootProvider::new_http(url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ReportError::transport("rpc", e.to_string()))
            .context("Failed to query chain id")?;

        if chain_id != network.chain_id {
            anyhow::bail!(ReportError::invalid(
                "network",
                format!(
                    "RPC endpoint serves chain {}, expected {}",
                    chain_id, network.chain_id
                )
            ));
        }

        info!("Connected to chain {}", chain_id);
        Ok(Self { provider, chain_id })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl StakeSource for StakingReader {
    #[instrument(skip(self, pool), fields(pid = pool.id))]
    async fn get_stake(&self, pool: &PoolInfo, user: Address) -> Result<StakeInfo> {
        let master_chef: Address = pool.master_chef.parse().map_err(|e| {
            ReportError::shape(format!("bad masterChef '{}': {}", pool.master_chef, e))
        })?;
        let contract = IMasterChef::new(master_chef, &self.provider);
        let pid = U256::from(pool.id);

        let user_info = contract
            .userInfo(pid, user)
            .call()
            .await
            .map_err(|e| ReportError::transport("rpc", e.to_string()))
            .with_context(|| format!("userInfo failed for pool {}", pool.id))?;
        let pending = contract
            .pendingReward(pid, user)
            .call()
            .await
            .map_err(|e| ReportError::transport("rpc", e.to_string()))
            .with_context(|| format!("pendingReward failed for pool {}", pool.id))?;

        let stake = StakeInfo {
            amount: wei_to_decimal(user_info.amount, 18)?,
            reward_debt: wei_to_decimal(user_info.rewardDebt, 18)?,
            pending_reward: wei_to_decimal(pending.pending, 18)?,
        };
        debug!("Stake {:?}", stake);
        Ok(stake)
    }
}
