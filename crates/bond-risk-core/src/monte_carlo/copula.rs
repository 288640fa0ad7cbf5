use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::BondRiskError;
use crate::BondRiskResult;

/// One-factor Gaussian copula for correlated defaults.
///
/// Latent asset value X = sqrt(rho) M + sqrt(1 - rho) eps with M, eps ~ N(0,1);
/// an obligor defaults when X falls below Phi^-1(PD).
#[derive(Debug, Clone)]
pub struct GaussianCopula {
    systemic_loading: f64,
    idiosyncratic_loading: f64,
    standard_normal: Normal,
}

impl GaussianCopula {
    pub fn new(correlation: f64) -> BondRiskResult<Self> {
        if !(0.0..1.0).contains(&correlation) {
            return Err(BondRiskError::invalid(
                "default_correlation",
                format!("Default correlation must be in [0, 1), got {correlation}."),
            ));
        }
        let standard_normal = Normal::new(0.0, 1.0).map_err(|e| BondRiskError::InvalidInput {
            field: "distribution".into(),
            reason: format!("Invalid Normal parameters: {e}"),
        })?;
        Ok(Self {
            systemic_loading: correlation.sqrt(),
            idiosyncratic_loading: (1.0 - correlation).sqrt(),
            standard_normal,
        })
    }

    /// Default threshold Phi^-1(pd) for a PD given as a decimal.
    pub fn threshold(&self, pd: f64) -> f64 {
        if pd <= 0.0 {
            f64::NEG_INFINITY
        } else if pd >= 1.0 {
            f64::INFINITY
        } else {
            self.standard_normal.inverse_cdf(pd)
        }
    }

    pub fn latent(&self, systemic: f64, idiosyncratic: f64) -> f64 {
        self.systemic_loading * systemic + self.idiosyncratic_loading * idiosyncratic
    }

    pub fn defaults(&self, systemic: f64, idiosyncratic: f64, threshold: f64) -> bool {
        self.latent(systemic, idiosyncratic) < threshold
    }
}
