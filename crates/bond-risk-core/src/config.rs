use serde::{Deserialize, Serialize};

use crate::error::BondRiskError;
use crate::monte_carlo::SimulationParams;
use crate::state::{DEFAULT_COMPANY, DEFAULT_TOTAL_MARKET_VALUE};
use crate::types::Money;
use crate::BondRiskResult;

/// Engine settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub universe: UniverseConfig,
    pub portfolio: PortfolioConfig,
    pub simulation: SimulationConfig,
}

/// Synthetic bond universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub seed: u64,
    pub count: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self { seed: 42, count: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Key the portfolio is stored under
    pub company: String,
    pub default_total_market_value: Money,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            company: DEFAULT_COMPANY.to_string(),
            default_total_market_value: DEFAULT_TOTAL_MARKET_VALUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub scenarios: usize,
    pub seed: u64,
    #[serde(flatten)]
    pub params: SimulationParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenarios: 1000,
            seed: 123,
            params: SimulationParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> BondRiskResult<()> {
        if self.universe.count == 0 {
            return Err(BondRiskError::invalid(
                "universe.count",
                "The universe needs at least one bond.",
            ));
        }
        if self.portfolio.company.trim().is_empty() {
            return Err(BondRiskError::invalid(
                "portfolio.company",
                "Company identifier must not be empty.",
            ));
        }
        if self.portfolio.default_total_market_value.is_sign_negative() {
            return Err(BondRiskError::invalid(
                "portfolio.default_total_market_value",
                "Total market value must be non-negative.",
            ));
        }
        if self.simulation.scenarios == 0 {
            return Err(BondRiskError::invalid(
                "simulation.scenarios",
                "At least one scenario is required.",
            ));
        }
        self.simulation.params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_json_is_default() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.universe.seed, 42);
        assert_eq!(cfg.universe.count, 50);
        assert_eq!(cfg.simulation.scenarios, 1000);
        assert_eq!(cfg.simulation.seed, 123);
        assert_eq!(cfg.simulation.params.short_rate.long_run_mean, 0.035);
        assert_eq!(cfg.portfolio.default_total_market_value, dec!(50000000));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_simulation_section_is_flat() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{"simulation": {"scenarios": 250, "default_correlation": 0.3,
                "short_rate": {"volatility": 0.02}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.simulation.scenarios, 250);
        assert_eq!(cfg.simulation.seed, 123);
        assert_eq!(cfg.simulation.params.default_correlation, 0.3);
        assert_eq!(cfg.simulation.params.short_rate.volatility, 0.02);
        assert_eq!(cfg.simulation.params.histogram_buckets, 20);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = EngineConfig::default();
        cfg.simulation.scenarios = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.universe.count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.simulation.params.default_correlation = 1.5;
        assert!(cfg.validate().is_err());
    }
}
