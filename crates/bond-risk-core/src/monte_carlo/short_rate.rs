use serde::{Deserialize, Serialize};

use crate::error::BondRiskError;
use crate::BondRiskResult;

/// Vasicek short-rate model: dr = kappa (theta - r) dt + sigma dW.
///
/// All rates are decimals (0.03 = 3%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortRateParams {
    /// r0
    pub current_rate: f64,
    /// theta
    pub long_run_mean: f64,
    /// kappa
    pub reversion_speed: f64,
    /// sigma
    pub volatility: f64,
}

impl Default for ShortRateParams {
    fn default() -> Self {
        Self {
            current_rate: 0.03,
            long_run_mean: 0.035,
            reversion_speed: 0.15,
            volatility: 0.01,
        }
    }
}

impl ShortRateParams {
    pub fn validate(&self) -> BondRiskResult<()> {
        for (field, v) in [
            ("short_rate.current_rate", self.current_rate),
            ("short_rate.long_run_mean", self.long_run_mean),
            ("short_rate.reversion_speed", self.reversion_speed),
            ("short_rate.volatility", self.volatility),
        ] {
            if !v.is_finite() {
                return Err(BondRiskError::invalid(field, "Must be a finite number."));
            }
        }
        if self.reversion_speed <= 0.0 {
            return Err(BondRiskError::invalid(
                "short_rate.reversion_speed",
                "Mean reversion speed must be positive.",
            ));
        }
        if self.volatility < 0.0 {
            return Err(BondRiskError::invalid(
                "short_rate.volatility",
                "Volatility must be non-negative.",
            ));
        }
        Ok(())
    }

    /// E[r1 | r0] after one year.
    pub fn expected_rate(&self) -> f64 {
        self.long_run_mean + (self.current_rate - self.long_run_mean) * (-self.reversion_speed).exp()
    }

    /// Std dev of r1 given r0 after one year.
    pub fn step_std_dev(&self) -> f64 {
        let k = self.reversion_speed;
        self.volatility * ((1.0 - (-2.0 * k).exp()) / (2.0 * k)).sqrt()
    }

    /// Exact one-year step driven by a standard normal draw `z`.
    pub fn step(&self, z: f64) -> f64 {
        self.expected_rate() + self.step_std_dev() * z
    }

    /// r1 - r0 for the draw `z`: the parallel yield shift applied to every bond.
    pub fn yield_shift(&self, z: f64) -> f64 {
        self.step(z) - self.current_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_draw_moves_toward_mean() {
        let p = ShortRateParams::default();
        let r1 = p.step(0.0);
        assert!(r1 > p.current_rate && r1 < p.long_run_mean);
        assert!(p.yield_shift(0.0) > 0.0);
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let p = ShortRateParams {
            volatility: 0.0,
            ..Default::default()
        };
        assert_eq!(p.step(3.0), p.step(-3.0));
    }

    #[test]
    fn test_step_std_dev_below_sigma() {
        let p = ShortRateParams::default();
        // Mean reversion damps one-year variance below sigma^2 * 1y
        assert!(p.step_std_dev() < p.volatility);
        assert!(p.step_std_dev() > 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(ShortRateParams::default().validate().is_ok());
        let bad_kappa = ShortRateParams {
            reversion_speed: 0.0,
            ..Default::default()
        };
        assert!(bad_kappa.validate().is_err());
        let bad_sigma = ShortRateParams {
            volatility: -0.01,
            ..Default::default()
        };
        assert!(bad_sigma.validate().is_err());
        let nan = ShortRateParams {
            current_rate: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
