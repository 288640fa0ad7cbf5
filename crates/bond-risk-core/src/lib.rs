pub mod analytics;
pub mod bonds;
pub mod config;
pub mod credit;
pub mod error;
pub mod fixed_income;
pub mod monte_carlo;
pub mod portfolio;
pub mod session;
pub mod state;
pub mod types;

pub use error::BondRiskError;
pub use types::*;

pub use analytics::{
    enrich_payload, price_universe, BondAnalytics, ExternalProcessAnalytics, InProcessAnalytics,
};
pub use bonds::{generate, Bond, BondMetrics, BondTerms, BondType, CreditRating, Sector};
pub use config::EngineConfig;
pub use portfolio::{
    analyze_portfolio, apply_portfolio_weights, calculate_portfolio_summary, calculate_rebalance,
    normalize_weights, rebalance, PortfolioSummary, PositionedBond, RebalanceAction, WeightMap,
};
pub use session::PortfolioSession;
pub use state::{
    load_portfolio_state, save_portfolio_state, InMemoryStore, JsonFileStore, PortfolioRecord,
    PortfolioState, PortfolioStore, StateLoad, StateSource,
};

#[cfg(feature = "simulation")]
pub use monte_carlo::{run_simulation, simulate, simulate_cancellable, MonteCarloResult, SimulationRun};

pub type BondRiskResult<T> = Result<T, BondRiskError>;
