use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use super::{to_csv, to_json, OutputFormat, RenderOptions, TextTable};
use crate::farming::FarmPool;
use crate::utils::{format_report_date, iso_timestamp};

pub const FARMING_CSV_HEADER: [&str; 19] = [
    "farm",
    "poolname",
    "timestamp",
    "token0",
    "token1",
    "rewardToken",
    "single",
    "tvl",
    "lpTokenPrice",
    "lpStaked",
    "rewardPrice",
    "rewardPerBlock",
    "apr",
    "dailyPr",
    "stakeAmount",
    "stakeRewardDebt",
    "stakePendingReward",
    "stakeTotalUSD",
    "stakeRewardPendingUSD",
];

/// Staked pools of one farm, as of `generated_at`.
#[derive(Debug, Clone)]
pub struct FarmReport {
    pub farm: String,
    pub pools: Vec<FarmPool>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FarmRecord<'a> {
    farm: &'a str,
    poolname: String,
    timestamp: &'a str,
    token0: &'a str,
    token1: &'a str,
    reward_token: &'a str,
    single: bool,
    tvl: String,
    lp_token_price: String,
    lp_staked: String,
    reward_price: String,
    reward_per_block: String,
    apr: String,
    daily_pr: String,
    stake_amount: String,
    stake_reward_debt: String,
    stake_pending_reward: String,
    #[serde(rename = "stakeTotalUSD")]
    stake_total_usd: String,
    #[serde(rename = "stakeRewardPendingUSD")]
    stake_reward_pending_usd: String,
}

pub fn render_farming(report: &FarmReport, options: &RenderOptions) -> Result<String> {
    let trimmer = &options.trimmer;
    let date = format_report_date(report.generated_at);

    match options.format {
        OutputFormat::Table => {
            let mut table = TextTable::new([
                date.as_str(),
                "Invested",
                "daily PR",
                "Pending",
                "Pending USD",
            ]);
            for pool in &report.pools {
                table.push([
                    pool.pool_name(),
                    trimmer.trim(pool.stake_total_usd),
                    trimmer.trim(pool.daily_pr),
                    format!(
                        "{} {}",
                        trimmer.trim(pool.stake_pending_reward),
                        pool.reward_token.to_uppercase()
                    ),
                    format!("${}", trimmer.trim(pool.stake_reward_pending_usd)),
                ]);
            }
            Ok(table.to_string())
        }
        OutputFormat::Csv => {
            let timestamp = iso_timestamp(report.generated_at);
            let records: Vec<FarmRecord> = report
                .pools
                .iter()
                .map(|pool| FarmRecord {
                    farm: &report.farm,
                    poolname: pool.pool_name(),
                    timestamp: &timestamp,
                    token0: &pool.token0,
                    token1: pool.token1.as_deref().unwrap_or_default(),
                    reward_token: &pool.reward_token,
                    single: pool.single,
                    tvl: pool.tvl.to_string(),
                    lp_token_price: trimmer.trim(pool.lp_token_price),
                    lp_staked: pool.lp_staked.to_string(),
                    reward_price: trimmer.trim(pool.reward_price),
                    reward_per_block: trimmer.trim(pool.reward_per_block),
                    apr: trimmer.trim(pool.apr),
                    daily_pr: trimmer.trim(pool.daily_pr),
                    stake_amount: trimmer.trim(pool.stake_amount),
                    stake_reward_debt: trimmer.trim(pool.stake_reward_debt),
                    stake_pending_reward: trimmer.trim(pool.stake_pending_reward),
                    stake_total_usd: trimmer.trim(pool.stake_total_usd),
                    stake_reward_pending_usd: trimmer.trim(pool.stake_reward_pending_usd),
                })
                .collect();
            to_csv(&FARMING_CSV_HEADER, &records, options.header)
        }
        OutputFormat::Json => to_json(&report.pools),
        OutputFormat::Org => {
            let mut out = format!("* {} {}", report.farm, date);
            for pool in &report.pools {
                write!(out, "\n** Pool: {}", pool.pool_name())?;
                write!(out, "\n  - Invested: ${}", trimmer.trim(pool.stake_total_usd))?;
                write!(
                    out,
                    "\n  - Pending: {} {} (${} @ {})",
                    trimmer.trim(pool.stake_pending_reward),
                    pool.reward_token.to_uppercase(),
                    trimmer.trim(pool.stake_reward_pending_usd),
                    trimmer.trim(pool.reward_price)
                )?;
                write!(out, "\n  - DailyPR: {}%", trimmer.trim(pool.daily_pr))?;
            }
            Ok(out)
        }
    }
}
