pub mod generate;
pub mod metrics;
pub mod rebalance;
pub mod simulate;
pub mod state;
pub mod summary;

use bond_risk_core::state::StateSource;
use bond_risk_core::{BondTerms, EngineConfig, JsonFileStore, PortfolioSession, WeightMap};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::input;

/// A portfolio supplied as JSON: bonds plus optional weights and size.
#[derive(Debug, Deserialize)]
pub struct PortfolioFile {
    pub bonds: Vec<BondTerms>,
    #[serde(default)]
    pub weights: WeightMap,
    #[serde(default)]
    pub total_market_value: Option<Decimal>,
}

/// `--input <file>` first, then piped stdin, else `None`.
pub fn read_input<T: DeserializeOwned>(
    path: &Option<String>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(input::file::read_json(p)?)),
        None => input::stdin::read_piped(),
    }
}

/// A session over the configured universe, restored from the store in
/// `store_dir` when one is given.
pub fn open_session(
    config: &EngineConfig,
    store_dir: Option<&str>,
) -> Result<(PortfolioSession, Option<StateSource>), Box<dyn std::error::Error>> {
    let mut session = PortfolioSession::new(config.clone())?;
    let source = match store_dir {
        Some(dir) => Some(session.load(&JsonFileStore::new(dir))?),
        None => None,
    };
    debug!(?source, bonds = session.bonds().len(), "session opened");
    Ok((session, source))
}
