use bond_risk_core::portfolio::PortfolioAnalysisInput;
use bond_risk_core::types::ComputationOutput;
use bond_risk_core::{analyze_portfolio, EngineConfig};
use clap::Args;
use serde_json::Value;

use super::{open_session, read_input, PortfolioFile};

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to a portfolio JSON file `{bonds, weights?, total_market_value?}`
    #[arg(long)]
    pub input: Option<String>,

    /// Directory of the JSON portfolio store to restore weights from
    #[arg(long)]
    pub store_dir: Option<String>,

    /// Include every positioned bond, not just the summary
    #[arg(long)]
    pub positions: bool,
}

pub fn run_summary(
    args: SummaryArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input = match read_input::<PortfolioFile>(&args.input)? {
        Some(file) => PortfolioAnalysisInput {
            bonds: file.bonds,
            weights: file.weights,
            total_market_value: file
                .total_market_value
                .unwrap_or(config.portfolio.default_total_market_value),
        },
        None => {
            let (session, _) = open_session(config, args.store_dir.as_deref())?;
            PortfolioAnalysisInput {
                bonds: session.bonds().iter().map(|b| b.terms.clone()).collect(),
                weights: session.state().weights.clone(),
                total_market_value: session.state().total_market_value,
            }
        }
    };

    let out = analyze_portfolio(&analysis_input)?;
    if args.positions {
        return Ok(serde_json::to_value(out)?);
    }
    let summary_only = ComputationOutput {
        result: out.result.summary,
        methodology: out.methodology,
        assumptions: out.assumptions,
        warnings: out.warnings,
        metadata: out.metadata,
    };
    Ok(serde_json::to_value(summary_only)?)
}
