use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::bonds::types::{BondType, CreditRating, Sector};
use crate::error::BondRiskError;
use crate::types::{Money, Percent, Rate};
use crate::BondRiskResult;

/// LGD applied to sovereign paper regardless of sector.
pub const GOVERNMENT_LGD: Rate = dec!(0.05);

/// LGD for a corporate sector with no table entry.
pub const DEFAULT_CORPORATE_LGD: Rate = dec!(0.40);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditMetrics {
    /// Annual probability of default, percent in [0, 100)
    pub pd: Percent,
    /// Loss given default, percent
    pub lgd: Percent,
    /// exposure * PD * LGD, annualised
    pub expected_loss: Money,
}

/// One-year PD by rating (decimal). Monotone across the rated scale: AAA
/// lowest, CCC highest. NR sits at 0.1% and is excluded from the ordering.
pub fn probability_of_default(rating: CreditRating) -> Rate {
    match rating {
        CreditRating::AAA => dec!(0.0002),
        CreditRating::AAPlus => dec!(0.0003),
        CreditRating::AA => dec!(0.0005),
        CreditRating::AAMinus => dec!(0.0008),
        CreditRating::APlus => dec!(0.0012),
        CreditRating::A => dec!(0.0018),
        CreditRating::AMinus => dec!(0.0025),
        CreditRating::BBBPlus => dec!(0.004),
        CreditRating::BBB => dec!(0.007),
        CreditRating::BBBMinus => dec!(0.012),
        CreditRating::BBPlus => dec!(0.02),
        CreditRating::BB => dec!(0.035),
        CreditRating::BPlus => dec!(0.06),
        CreditRating::B => dec!(0.09),
        CreditRating::BMinus => dec!(0.13),
        CreditRating::CCC => dec!(0.27),
        CreditRating::NotRated => dec!(0.001),
    }
}

/// LGD (decimal) keyed by seniority proxy: sovereigns near zero,
/// corporates by sector.
pub fn loss_given_default(bond_type: BondType, sector: Sector) -> Rate {
    if bond_type == BondType::Government {
        return GOVERNMENT_LGD;
    }
    match sector {
        Sector::Banking => dec!(0.45),
        Sector::Technology => dec!(0.40),
        Sector::Healthcare => dec!(0.35),
        Sector::Energy => dec!(0.50),
        Sector::Utilities => dec!(0.35),
        Sector::Telecom => dec!(0.45),
        Sector::Industrials => dec!(0.40),
        Sector::Consumer => dec!(0.35),
        Sector::FinancialServices => dec!(0.40),
        // No table entry for these on a corporate.
        Sector::Government | Sector::Other => DEFAULT_CORPORATE_LGD,
    }
}

/// PD, LGD and expected loss for an exposure (market value).
pub fn credit_metrics(
    rating: CreditRating,
    sector: Sector,
    bond_type: BondType,
    exposure: Money,
) -> BondRiskResult<CreditMetrics> {
    if exposure < Decimal::ZERO {
        return Err(BondRiskError::invalid(
            "exposure",
            "Exposure must be non-negative.",
        ));
    }
    let pd = probability_of_default(rating);
    let lgd = loss_given_default(bond_type, sector);
    Ok(CreditMetrics {
        pd: pd * dec!(100),
        lgd: lgd * dec!(100),
        expected_loss: exposure * pd * lgd,
    })
}
