use alloy::primitives::Address;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::io::Write;
use tracing::instrument;

use super::{parse_address, CommonArgs};
use crate::config::Config;
use crate::farming::{FarmApiClient, FarmingService, StakeSource, StakingReader};
use crate::render::{render_farming, FarmReport, RenderOptions};

/// `farming` command flags.
#[derive(Debug, Clone, Args)]
pub struct FarmingArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Account address (falls back to AAVE_ACCOUNT)
    #[arg(short, long, env = "FARMING_ACCOUNT")]
    pub address: Option<String>,

    /// Farm to report on
    #[arg(long, default_value = "ironfinance")]
    pub farm: String,

    /// Include every pool, not just staked ones
    #[arg(long)]
    pub allpools: bool,
}

impl FarmingArgs {
    fn resolved_address(&self) -> Option<String> {
        self.address
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| std::env::var("AAVE_ACCOUNT").ok())
    }
}

pub async fn run_farming<W: Write>(args: &FarmingArgs, config: &Config, out: &mut W) -> Result<()> {
    let address = parse_address(args.resolved_address().as_deref())?;
    let farm = config.farm(&args.farm, &args.common.network)?;
    let network = config.network(&farm.network)?;

    let pools = FarmApiClient::new(&farm.api_url, config.http.timeout())?;
    let stakes = StakingReader::connect(network).await?;
    let service = FarmingService::new(pools, stakes);

    report_farming(
        &service,
        &args.farm,
        address,
        args.allpools,
        &args.common.render_options(),
        out,
    )
    .await
}

#[instrument(skip_all, fields(farm = %farm, address = %address, all_pools = all_pools))]
async fn report_farming<S: StakeSource, W: Write>(
    service: &FarmingService<S>,
    farm: &str,
    address: Address,
    all_pools: bool,
    options: &RenderOptions,
    out: &mut W,
) -> Result<()> {
    let pools = service.get_balances(address, all_pools).await?;
    let report = FarmReport {
        farm: farm.to_string(),
        pools,
        generated_at: Utc::now(),
    };

    let rendered = render_farming(&report, options)?;
    writeln!(out, "{}", rendered)?;
    out.flush()?;
    Ok(())
}
