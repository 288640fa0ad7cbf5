use bond_risk_core::analytics::{EnrichRequest, EnrichResponse};
use bond_risk_core::{enrich_payload, BondAnalytics, ExternalProcessAnalytics};
use clap::Args;
use serde_json::Value;

use super::read_input;

/// Arguments for bond enrichment
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to a `{"bonds": [...]}` JSON file (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// External analytics program speaking the same JSON contract
    #[arg(long)]
    pub executor: Option<String>,

    /// Argument passed to the external program (repeatable)
    #[arg(long = "executor-arg", allow_hyphen_values = true)]
    pub executor_args: Vec<String>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payload = read_input::<Value>(&args.input)?
        .ok_or("--input <file.json> or stdin required for bond metrics")?;

    match args.executor {
        Some(program) => {
            let request: EnrichRequest = serde_json::from_value(payload)?;
            let executor = ExternalProcessAnalytics::new(program, args.executor_args);
            let bonds = executor.enrich(&request.bonds)?;
            Ok(serde_json::to_value(EnrichResponse { bonds })?)
        }
        None => Ok(enrich_payload(&payload)?),
    }
}
