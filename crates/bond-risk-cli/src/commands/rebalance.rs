use bond_risk_core::portfolio::RebalanceInput;
use bond_risk_core::{calculate_rebalance, EngineConfig, JsonFileStore, RebalanceAction};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{open_session, read_input, PortfolioFile};

/// Arguments for a rebalance action
#[derive(Args)]
pub struct RebalanceArgs {
    /// increase_short_dated, increase_long_dated, increase_investment_grade
    /// or increase_lower_rated_debt
    #[arg(long)]
    pub action: RebalanceAction,

    /// Percentage points of weight to move, within [0, 100]
    #[arg(long, default_value = "10")]
    pub shift: Decimal,

    /// Path to a portfolio JSON file `{bonds, weights?}`
    #[arg(long)]
    pub input: Option<String>,

    /// Directory of the JSON portfolio store
    #[arg(long)]
    pub store_dir: Option<String>,

    /// Persist the normalized result to the store (requires --store-dir)
    #[arg(long)]
    pub save: bool,
}

pub fn run_rebalance(
    args: RebalanceArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(file) = read_input::<PortfolioFile>(&args.input)? {
        if args.save {
            return Err("--save applies to the stored portfolio, not to --input files".into());
        }
        let input = RebalanceInput {
            bonds: file.bonds,
            weights: file.weights,
            action: args.action,
            shift_percent: args.shift,
        };
        return Ok(serde_json::to_value(calculate_rebalance(&input)?)?);
    }

    let (mut session, _) = open_session(config, args.store_dir.as_deref())?;
    let input = RebalanceInput {
        bonds: session.bonds().iter().map(|b| b.terms.clone()).collect(),
        weights: session.state().weights.clone(),
        action: args.action,
        shift_percent: args.shift,
    };
    let out = calculate_rebalance(&input)?;

    if args.save {
        let dir = args
            .store_dir
            .as_deref()
            .ok_or("--save requires --store-dir")?;
        session.rebalance(args.action, args.shift)?;
        session.save(&JsonFileStore::new(dir))?;
    }
    Ok(serde_json::to_value(out)?)
}
