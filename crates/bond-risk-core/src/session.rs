use rust_decimal::Decimal;
use tracing::info;

use crate::bonds::generator::generate;
use crate::bonds::types::Bond;
use crate::config::EngineConfig;
use crate::error::BondRiskError;
use crate::portfolio::rebalance::{rebalance, RebalanceAction};
use crate::portfolio::summary::{calculate_portfolio_summary, PortfolioSummary};
use crate::portfolio::weights::{apply_portfolio_weights, normalize_weights, PositionedBond};
use crate::state::{
    load_portfolio_state, save_portfolio_state, PortfolioState, PortfolioStore, StateSource,
};
use crate::types::{BondId, Money, Percent};
use crate::BondRiskResult;

#[cfg(feature = "simulation")]
use crate::monte_carlo::simulation::{simulate, MonteCarloResult};

/// A bond universe with the portfolio held over it.
///
/// Weights are kept normalized after every mutation that could unbalance
/// them, so positions always allocate the full market value.
#[derive(Debug, Clone)]
pub struct PortfolioSession {
    config: EngineConfig,
    bonds: Vec<Bond>,
    state: PortfolioState,
}

impl PortfolioSession {
    /// Generate the configured universe and hold it at equal weights.
    pub fn new(config: EngineConfig) -> BondRiskResult<Self> {
        config.validate()?;
        let bonds = generate(config.universe.seed, config.universe.count)?;
        let state =
            PortfolioState::equal_weighted(&bonds, config.portfolio.default_total_market_value);
        Ok(Self {
            config,
            bonds,
            state,
        })
    }

    /// Replace the portfolio state. Weights are normalized over the universe.
    pub fn with_state(mut self, state: PortfolioState) -> BondRiskResult<Self> {
        self.set_state(state)?;
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn positions(&self) -> BondRiskResult<Vec<PositionedBond>> {
        apply_portfolio_weights(&self.bonds, &self.state.weights, self.state.total_market_value)
    }

    pub fn summary(&self) -> BondRiskResult<PortfolioSummary> {
        Ok(calculate_portfolio_summary(&self.positions()?))
    }

    /// Apply a rebalance action, then renormalize.
    pub fn rebalance(&mut self, action: RebalanceAction, shift_percent: Percent) -> BondRiskResult<()> {
        let shifted = rebalance(&self.bonds, &self.state.weights, action, shift_percent)?;
        self.state.weights = normalize_weights(&shifted, &self.bonds);
        info!(%action, %shift_percent, "portfolio rebalanced");
        Ok(())
    }

    /// Set one bond's raw weight, then renormalize the rest around it.
    pub fn set_weight(&mut self, id: BondId, weight: Percent) -> BondRiskResult<()> {
        if !self.bonds.iter().any(|b| b.id() == id) {
            return Err(BondRiskError::invalid(
                "id",
                format!("Bond {id} is not in the universe."),
            ));
        }
        if weight < Decimal::ZERO {
            return Err(BondRiskError::invalid(
                "weight",
                "Weight must be non-negative.",
            ));
        }
        let mut raw = self.state.weights.clone();
        raw.insert(id, weight);
        self.state.weights = normalize_weights(&raw, &self.bonds);
        Ok(())
    }

    pub fn set_total_market_value(&mut self, total: Money) -> BondRiskResult<()> {
        if total < Decimal::ZERO {
            return Err(BondRiskError::invalid(
                "total_market_value",
                "Total market value must be non-negative.",
            ));
        }
        self.state.total_market_value = total;
        Ok(())
    }

    /// Run the configured simulation over the current positions.
    #[cfg(feature = "simulation")]
    pub fn simulate(&self) -> BondRiskResult<MonteCarloResult> {
        let sim = &self.config.simulation;
        simulate(&self.positions()?, sim.scenarios, sim.seed, &sim.params)
    }

    /// Load the configured company's portfolio, falling back to defaults.
    pub fn load(&mut self, store: &dyn PortfolioStore) -> BondRiskResult<StateSource> {
        let loaded = load_portfolio_state(
            store,
            &self.config.portfolio.company,
            &self.bonds,
            self.config.portfolio.default_total_market_value,
        )?;
        self.set_state(loaded.state)?;
        Ok(loaded.source)
    }

    pub fn save(&self, store: &dyn PortfolioStore) -> BondRiskResult<()> {
        save_portfolio_state(store, &self.config.portfolio.company, &self.state)
    }

    fn set_state(&mut self, state: PortfolioState) -> BondRiskResult<()> {
        if state.total_market_value < Decimal::ZERO {
            return Err(BondRiskError::invalid(
                "total_market_value",
                "Total market value must be non-negative.",
            ));
        }
        self.state = PortfolioState {
            weights: normalize_weights(&state.weights, &self.bonds),
            total_market_value: state.total_market_value,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::weights::{build_equal_weights, total_weight};
    use crate::state::InMemoryStore;
    use rust_decimal_macros::dec;

    fn small_config() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.universe.count = 12;
        cfg.simulation.scenarios = 200;
        cfg
    }

    #[test]
    fn test_new_session_is_equal_weighted() {
        let s = PortfolioSession::new(small_config()).unwrap();
        assert_eq!(s.bonds().len(), 12);
        assert_eq!(s.state().weights, build_equal_weights(s.bonds()));
        assert_eq!(s.summary().unwrap().total_market_value, dec!(50000000));
    }

    #[test]
    fn test_rebalance_keeps_weights_normalized() {
        let mut s = PortfolioSession::new(small_config()).unwrap();
        s.rebalance(RebalanceAction::IncreaseLongDated, dec!(10)).unwrap();
        assert!((total_weight(&s.state().weights) - dec!(100)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_set_weight_renormalizes() {
        let mut s = PortfolioSession::new(small_config()).unwrap();
        s.set_weight(1, Decimal::ZERO).unwrap();
        assert_eq!(s.state().weights[&1], Decimal::ZERO);
        assert!((total_weight(&s.state().weights) - dec!(100)).abs() < dec!(0.000000001));
        assert!(s.set_weight(999, dec!(1)).is_err());
        assert!(s.set_weight(2, dec!(-1)).is_err());
    }

    #[test]
    fn test_set_total_market_value() {
        let mut s = PortfolioSession::new(small_config()).unwrap();
        s.set_total_market_value(dec!(1000000)).unwrap();
        assert_eq!(s.summary().unwrap().total_market_value, dec!(1000000));
        assert!(s.set_total_market_value(dec!(-1)).is_err());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = InMemoryStore::new();
        let mut s = PortfolioSession::new(small_config()).unwrap();
        s.set_weight(3, dec!(40)).unwrap();
        s.set_total_market_value(dec!(2500000)).unwrap();
        s.save(&store).unwrap();

        let mut fresh = PortfolioSession::new(small_config()).unwrap();
        assert_eq!(fresh.load(&store).unwrap(), StateSource::Persisted);
        assert_eq!(fresh.state().total_market_value, dec!(2500000));
        let diff = (fresh.state().weights[&3] - s.state().weights[&3]).abs();
        assert!(diff < dec!(0.000001));
    }

    #[test]
    fn test_load_without_record_uses_defaults() {
        let store = InMemoryStore::new();
        let mut s = PortfolioSession::new(small_config()).unwrap();
        assert_eq!(s.load(&store).unwrap(), StateSource::Default);
        assert_eq!(s.state().weights, build_equal_weights(s.bonds()));
    }

    #[cfg(feature = "simulation")]
    #[test]
    fn test_session_simulation_uses_config() {
        let s = PortfolioSession::new(small_config()).unwrap();
        let r = s.simulate().unwrap();
        assert_eq!(r.scenario_count, 200);
        assert!(r.var99 >= r.var95);
    }
}
