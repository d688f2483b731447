use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ReportError;
use crate::utils::decimal::{deserialize_decimal_lenient, deserialize_integer_text, scaled_decimal};

/// Pool listing as published by the farm API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    /// Pool id on the MasterChef contract.
    #[serde(deserialize_with = "deserialize_pid")]
    pub id: u64,
    pub token0: String,
    #[serde(default)]
    pub token1: Option<String>,
    pub reward_token: String,
    #[serde(default)]
    pub single: bool,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub tvl: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub lp_token_price: Decimal,
    /// Wei on the wire, token units here.
    #[serde(deserialize_with = "deserialize_wei")]
    pub lp_staked: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub reward_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub reward_per_block: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub apr: Decimal,
    #[serde(deserialize_with = "deserialize_decimal_lenient")]
    pub daily_pr: Decimal,
    pub master_chef: String,
}

fn deserialize_pid<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = deserialize_integer_text(deserializer)?;
    text.trim().parse().map_err(serde::de::Error::custom)
}

fn deserialize_wei<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = deserialize_integer_text(deserializer)?;
    scaled_decimal(&text, 18)
        .map(|d| d.normalize())
        .map_err(serde::de::Error::custom)
}

/// One account's stake in one pool, in token units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StakeInfo {
    pub amount: Decimal,
    pub reward_debt: Decimal,
    pub pending_reward: Decimal,
}

impl StakeInfo {
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }
}

/// A pool listing merged with the account's stake in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPool {
    pub id: u64,
    pub token0: String,
    pub token1: Option<String>,
    pub reward_token: String,
    pub single: bool,
    pub tvl: Decimal,
    pub lp_token_price: Decimal,
    pub lp_staked: Decimal,
    pub reward_price: Decimal,
    pub reward_per_block: Decimal,
    pub apr: Decimal,
    pub daily_pr: Decimal,
    pub master_chef: String,
    pub stake_amount: Decimal,
    pub stake_reward_debt: Decimal,
    pub stake_pending_reward: Decimal,
    #[serde(rename = "stakeTotalUSD")]
    pub stake_total_usd: Decimal,
    #[serde(rename = "stakeRewardPendingUSD")]
    pub stake_reward_pending_usd: Decimal,
}

impl FarmPool {
    /// Merge a listing and a stake, pricing the stake and its pending reward.
    pub fn from_parts(pool: PoolInfo, stake: StakeInfo) -> Result<Self, ReportError> {
        let stake_total_usd = stake
            .amount
            .checked_mul(pool.lp_token_price)
            .ok_or_else(|| ReportError::shape(format!("stake value overflow in pool {}", pool.id)))?;
        let stake_reward_pending_usd = stake
            .pending_reward
            .checked_mul(pool.reward_price)
            .ok_or_else(|| {
                ReportError::shape(format!("pending reward overflow in pool {}", pool.id))
            })?;

        Ok(Self {
            id: pool.id,
            token0: pool.token0,
            token1: pool.token1,
            reward_token: pool.reward_token,
            single: pool.single,
            tvl: pool.tvl,
            lp_token_price: pool.lp_token_price,
            lp_staked: pool.lp_staked,
            reward_price: pool.reward_price,
            reward_per_block: pool.reward_per_block,
            apr: pool.apr,
            daily_pr: pool.daily_pr,
            master_chef: pool.master_chef,
            stake_amount: stake.amount,
            stake_reward_debt: stake.reward_debt,
            stake_pending_reward: stake.pending_reward,
            stake_total_usd: stake_total_usd.normalize(),
            stake_reward_pending_usd: stake_reward_pending_usd.normalize(),
        })
    }

    /// `TOKEN0` for single-asset pools, `TOKEN0-TOKEN1` otherwise.
    pub fn pool_name(&self) -> String {
        match (&self.token1, self.single) {
            (Some(token1), false) => {
                format!("{}-{}", self.token0.to_uppercase(), token1.to_uppercase())
            }
            _ => self.token0.to_uppercase(),
        }
    }
}
