use bond_risk_core::state::{PortfolioRecord, PortfolioState};
use bond_risk_core::{EngineConfig, JsonFileStore, PortfolioStore};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::open_session;
use crate::input;

/// Arguments for the persisted portfolio state
#[derive(Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,

    /// Directory of the JSON portfolio store
    #[arg(long, default_value = ".bondrisk", global = true)]
    pub store_dir: String,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// Show the stored portfolio, or the defaults if none is stored
    Show,
    /// Store a portfolio, starting from the current one
    Save {
        /// New total market value
        #[arg(long)]
        total: Option<Decimal>,

        /// JSON record `{"totalMarketValue": .., "weights": {"1": ..}}` to store
        #[arg(long)]
        input: Option<String>,
    },
    /// Remove the stored portfolio
    Reset,
}

pub fn run_state(args: StateArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let store = JsonFileStore::new(&args.store_dir);
    let company = config.portfolio.company.as_str();

    match args.command {
        StateCommand::Show => {
            let (session, source) = open_session(config, Some(args.store_dir.as_str()))?;
            Ok(json!({
                "company": company,
                "source": source,
                "state": session.state(),
            }))
        }
        StateCommand::Save { total, input } => {
            let (mut session, _) = open_session(config, Some(args.store_dir.as_str()))?;
            if let Some(path) = input {
                let record: PortfolioRecord = input::file::read_json(&path)?;
                let state = PortfolioState::from_record(&record)?;
                session = session.with_state(state)?;
            }
            if let Some(total) = total {
                session.set_total_market_value(total)?;
            }
            session.save(&store)?;
            Ok(json!({
                "company": company,
                "saved": true,
                "state": session.state(),
            }))
        }
        StateCommand::Reset => {
            let removed = store.remove(company)?;
            Ok(json!({ "company": company, "removed": removed }))
        }
    }
}
