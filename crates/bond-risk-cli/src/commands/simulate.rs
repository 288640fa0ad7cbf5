use bond_risk_core::monte_carlo::SimulationInput;
use bond_risk_core::{run_simulation, EngineConfig};
use clap::Args;
use serde_json::Value;

use super::{open_session, read_input, PortfolioFile};

/// Arguments for the Monte Carlo P&L simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a portfolio JSON file `{bonds, weights?, total_market_value?}`
    #[arg(long)]
    pub input: Option<String>,

    /// Number of scenarios (defaults to the configured count)
    #[arg(long)]
    pub scenarios: Option<usize>,

    /// Simulation seed (defaults to the configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory of the JSON portfolio store to restore weights from
    #[arg(long)]
    pub store_dir: Option<String>,
}

pub fn run_simulate(
    args: SimulateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (bonds, weights, total_market_value) = match read_input::<PortfolioFile>(&args.input)? {
        Some(file) => {
            let total = file
                .total_market_value
                .unwrap_or(config.portfolio.default_total_market_value);
            (file.bonds, file.weights, total)
        }
        None => {
            let (session, _) = open_session(config, args.store_dir.as_deref())?;
            (
                session.bonds().iter().map(|b| b.terms.clone()).collect(),
                session.state().weights.clone(),
                session.state().total_market_value,
            )
        }
    };

    let input = SimulationInput {
        bonds,
        weights,
        total_market_value,
        scenario_count: args.scenarios.unwrap_or(config.simulation.scenarios),
        seed: args.seed.unwrap_or(config.simulation.seed),
        params: config.simulation.params,
    };
    Ok(serde_json::to_value(run_simulation(&input)?)?)
}
