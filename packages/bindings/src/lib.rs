use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use bond_risk_core::config::UniverseConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Universe
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(default)]
struct GenerateRequest {
    seed: u64,
    count: usize,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        let universe = UniverseConfig::default();
        Self {
            seed: universe.seed,
            count: universe.count,
        }
    }
}

/// `{"seed"?, "count"?}` -> priced bonds.
#[napi]
pub fn generate_bonds(input_json: String) -> NapiResult<String> {
    let request: GenerateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let bonds = bond_risk_core::bonds::generator::generate(request.seed, request.count)
        .map_err(to_napi_error)?;
    serde_json::to_string(&bonds).map_err(to_napi_error)
}

/// `{"bonds": [...]}` -> the same bonds with metrics attached.
#[napi]
pub fn enrich_bonds(input_json: String) -> NapiResult<String> {
    let payload: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_risk_core::analytics::enrich_payload(&payload).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_summary(input_json: String) -> NapiResult<String> {
    let input: bond_risk_core::portfolio::PortfolioAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_risk_core::portfolio::analyze_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rebalance_weights(input_json: String) -> NapiResult<String> {
    let input: bond_risk_core::portfolio::RebalanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_risk_core::portfolio::calculate_rebalance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_simulation(input_json: String) -> NapiResult<String> {
    let input: bond_risk_core::monte_carlo::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bond_risk_core::monte_carlo::run_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
