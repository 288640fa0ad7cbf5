pub mod analysis;
pub mod rebalance;
pub mod summary;
pub mod weights;

pub use analysis::{analyze_portfolio, PortfolioAnalysis, PortfolioAnalysisInput};
pub use rebalance::{calculate_rebalance, rebalance, RebalanceAction, RebalanceInput, RebalanceOutput};
pub use summary::{calculate_portfolio_summary, BreakdownEntry, PortfolioSummary};
pub use weights::{
    apply_portfolio_weights, build_equal_weights, normalize_weights, total_weight,
    PositionedBond, WeightMap,
};
