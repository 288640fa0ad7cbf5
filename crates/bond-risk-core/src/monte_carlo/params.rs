use serde::{Deserialize, Serialize};

use super::short_rate::ShortRateParams;
use crate::error::BondRiskError;
use crate::BondRiskResult;

/// Model parameters for a portfolio P&L simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub short_rate: ShortRateParams,
    /// Gaussian copula loading rho on the systemic factor, in [0, 1)
    pub default_correlation: f64,
    pub histogram_buckets: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            short_rate: ShortRateParams::default(),
            default_correlation: 0.2,
            histogram_buckets: 20,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> BondRiskResult<()> {
        self.short_rate.validate()?;
        if !self.default_correlation.is_finite()
            || self.default_correlation < 0.0
            || self.default_correlation >= 1.0
        {
            return Err(BondRiskError::invalid(
                "default_correlation",
                format!(
                    "Default correlation must be in [0, 1), got {}.",
                    self.default_correlation
                ),
            ));
        }
        if self.histogram_buckets == 0 {
            return Err(BondRiskError::invalid(
                "histogram_buckets",
                "At least one histogram bucket is required.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParams::default().validate().is_ok());
    }

    #[test]
    fn test_correlation_bounds() {
        for rho in [-0.1, 1.0, f64::INFINITY] {
            let p = SimulationParams {
                default_correlation: rho,
                ..Default::default()
            };
            assert!(p.validate().is_err(), "rho={rho} accepted");
        }
        let zero = SimulationParams {
            default_correlation: 0.0,
            ..Default::default()
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let p: SimulationParams =
            serde_json::from_str(r#"{"short_rate": {"volatility": 0.02}}"#).unwrap();
        assert_eq!(p.short_rate.volatility, 0.02);
        assert_eq!(p.short_rate.current_rate, 0.03);
        assert_eq!(p.histogram_buckets, 20);
    }
}
