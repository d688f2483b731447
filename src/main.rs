//! defi-watch - Main Entry Point

use anyhow::Result;
use clap::{Parser, Subcommand};
use defi_watch::commands::{
    run_balance, run_farming, run_rates, BalanceArgs, CommonArgs, FarmingArgs, RatesArgs,
};
use defi_watch::config::{Config, LoggingConfig};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// defi-watch CLI
#[derive(Parser)]
#[command(name = "defi-watch")]
#[command(version, about = "Aave solvency, rate history and yield-farm reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get Aave balance and health
    Balance(BalanceArgs),

    /// Get Aave reserve rates
    Rates(RatesArgs),

    /// Get yield farming positions
    Farming(FarmingArgs),
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Commands::Balance(args) => &args.common,
            Commands::Rates(args) => &args.common,
            Commands::Farming(args) => &args.common,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    // Held until exit so the file writer flushes
    let _guard = init_logging(cli.command.common().verbose, &config.logging)?;
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Balance(args) => run_balance(args, &config, &mut out).await,
        Commands::Rates(args) => run_rates(args, &config, &mut out).await,
        Commands::Farming(args) => run_farming(args, &config, &mut out).await,
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("defi_watch={}", level).parse()?);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(verbose);

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let file_appender = tracing_appender::rolling::daily(directory, "defi-watch.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
