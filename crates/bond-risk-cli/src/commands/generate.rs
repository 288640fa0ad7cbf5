use bond_risk_core::bonds::generator;
use bond_risk_core::EngineConfig;
use clap::Args;
use serde_json::Value;

/// Arguments for universe generation
#[derive(Args)]
pub struct GenerateArgs {
    /// Seed for the universe (defaults to the configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of bonds (defaults to the configured count)
    #[arg(long)]
    pub count: Option<usize>,

    /// Emit only the bond terms, without derived metrics
    #[arg(long)]
    pub terms_only: bool,
}

pub fn run_generate(
    args: GenerateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let seed = args.seed.unwrap_or(config.universe.seed);
    let count = args.count.unwrap_or(config.universe.count);
    if args.terms_only {
        Ok(serde_json::to_value(generator::generate_terms(seed, count)?)?)
    } else {
        Ok(serde_json::to_value(generator::generate(seed, count)?)?)
    }
}
