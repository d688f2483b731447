use alloy::primitives::Address;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args};
use rust_decimal::Decimal;
use std::io::Write;
use tracing::{info, instrument};

use super::{parse_address, CommonArgs};
use crate::alert::{AlertChannel, AlertOutcome, IftttChannel, ThresholdAlertDispatcher};
use crate::config::Config;
use crate::protocol::{AaveClient, AaveV2Math, LendingDataSource, SummaryCalculator};
use crate::render::{render_balance, Denominations, RenderOptions};
use crate::report::fetch_balance;
use crate::utils::Trimmer;

pub const HEALTH_WARNING: &str = "WARNING, health below threshold!";

/// `balance` command flags.
#[derive(Debug, Clone, Args)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Account address
    #[arg(short, long, env = "AAVE_ACCOUNT")]
    pub address: Option<String>,

    /// Show USD values
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
    pub usd: bool,

    /// Show ETH values
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true")]
    pub eth: bool,

    /// Warn when health drops under this threshold (0 = off)
    #[arg(long, default_value = "0")]
    pub warn: Decimal,

    /// IFTTT key to post the warning with
    #[arg(long, env = "AAVE_IFTTT")]
    pub ifttt: Option<String>,
}

impl BalanceArgs {
    fn denominations(&self) -> Denominations {
        Denominations {
            usd: self.usd,
            eth: self.eth,
        }
    }
}

pub async fn run_balance<W: Write>(args: &BalanceArgs, config: &Config, out: &mut W) -> Result<()> {
    let address = parse_address(args.address.as_deref())?;
    let network = config.network(&args.common.network)?;
    let source = AaveClient::new(&network.subgraph_url, config.http.timeout())?;

    let channel = match args.ifttt.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Some(Box::new(IftttChannel::new(
            &config.alert.webhook_url,
            key,
            config.http.timeout(),
        )?) as Box<dyn AlertChannel>),
        _ => None,
    };
    let dispatcher = ThresholdAlertDispatcher::new(
        args.warn,
        config.alert.event.clone(),
        Trimmer::new(args.common.decimals),
        channel,
    );

    report_balance(
        &source,
        &AaveV2Math,
        address,
        args.denominations(),
        &args.common.render_options(),
        dispatcher,
        Utc::now(),
        out,
    )
    .await?;
    Ok(())
}

/// Fetch, render, then check the health threshold.
///
/// Nothing is written unless every fetch succeeds. The alert is dispatched
/// only after the report has been written.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(address = %address))]
pub async fn report_balance<W: Write>(
    source: &dyn LendingDataSource,
    calculator: &dyn SummaryCalculator,
    address: Address,
    denominations: Denominations,
    options: &RenderOptions,
    dispatcher: ThresholdAlertDispatcher,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<AlertOutcome> {
    let report = fetch_balance(source, calculator, &address.to_string(), now).await?;
    let rendered = render_balance(&report, denominations, options)?;
    writeln!(out, "{}", rendered)?;

    let health = report.summary.health_factor;
    if dispatcher.is_breached(health) {
        writeln!(out, "{}", HEALTH_WARNING)?;
        if dispatcher.has_channel() {
            writeln!(out, "Sending to IFTTT")?;
        }
    }
    out.flush()?;

    let outcome = dispatcher.dispatch(health).await;
    info!("Health {} alert outcome {:?}", health, outcome);
    Ok(outcome)
}
