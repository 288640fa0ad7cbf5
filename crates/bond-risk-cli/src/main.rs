mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::generate::GenerateArgs;
use commands::metrics::MetricsArgs;
use commands::rebalance::RebalanceArgs;
use commands::simulate::SimulateArgs;
use commands::state::StateArgs;
use commands::summary::SummaryArgs;

/// Fixed-income portfolio analytics
#[derive(Parser)]
#[command(
    name = "bondrisk",
    version,
    about = "Fixed-income portfolio analytics",
    long_about = "A CLI for bond portfolio analytics with decimal precision. Generates a \
                  synthetic bond universe, prices bonds, aggregates portfolio risk, \
                  rebalances weights and runs Monte Carlo P&L simulation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (JSON, or YAML by extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the synthetic bond universe
    Generate(GenerateArgs),
    /// Price bonds from a `{"bonds": [...]}` payload
    Metrics(MetricsArgs),
    /// Portfolio risk summary (duration, PV01, expected loss, breakdowns)
    Summary(SummaryArgs),
    /// Shift weight towards a subset of bonds
    Rebalance(RebalanceArgs),
    /// Monte Carlo one-year P&L (VaR, CVaR)
    Simulate(SimulateArgs),
    /// Show, save or reset the persisted portfolio
    State(StateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dispatch(
    command: Commands,
    config_path: Option<&str>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let config = input::file::read_config(config_path)?;
    match command {
        Commands::Generate(args) => commands::generate::run_generate(args, &config),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Summary(args) => commands::summary::run_summary(args, &config),
        Commands::Rebalance(args) => commands::rebalance::run_rebalance(args, &config),
        Commands::Simulate(args) => commands::simulate::run_simulate(args, &config),
        Commands::State(args) => commands::state::run_state(args, &config),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Version = cli.command {
        println!("bondrisk {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = dispatch(cli.command, cli.config.as_deref())
        .and_then(|value| Ok(output::format_output(&cli.output, &value)?));
    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}
