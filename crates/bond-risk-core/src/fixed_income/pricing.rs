use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::bonds::types::{BondTerms, BondType, Cashflow};
use crate::error::BondRiskError;
use crate::types::{Money, Percent, Rate};
use crate::BondRiskResult;

/// One basis point as a decimal rate.
pub const ONE_BP: Rate = dec!(0.0001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Price and risk analytics for one unit of a fixed-rate bullet bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOutput {
    pub cashflows: Vec<Cashflow>,
    /// Sum of discounted cashflows
    pub market_price: Money,
    /// Weighted-average time to cashflow (years)
    pub macaulay_duration: Decimal,
    /// Macaulay duration / (1 + y)
    pub duration: Decimal,
    /// sum(t(t+1) PV_t) / (P (1+y)^2)
    pub convexity: Decimal,
    /// Price change for a 1bp parallel yield move (modified duration * price * 0.0001)
    pub pv01: Money,
    /// Equal to PV01 per unit; scaled to currency on positions
    pub dv01: Money,
    /// Spread sensitivity, PV01 for corporates and zero for governments
    pub cr01: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a bond from its terms.
///
/// Annual compounding, no day count: coupon dates fall on whole years and
/// settlement is on a coupon date. Discount factors are built by iterative
/// multiplication (never `powd()`) for full decimal precision.
pub fn price(terms: &BondTerms) -> BondRiskResult<PricingOutput> {
    validate_terms(terms)?;

    let y = terms.yield_to_maturity / dec!(100);
    let one_plus_y = Decimal::ONE + y;
    let cashflows = build_cashflows(
        terms.face_value,
        terms.coupon_rate,
        y,
        terms.maturity_years,
    )
    .ok_or_else(|| out_of_range(terms))?;

    let mut market_price = Decimal::ZERO;
    let mut time_weighted = Decimal::ZERO;
    let mut convexity_sum = Decimal::ZERO;
    for cf in &cashflows {
        let t = Decimal::from(cf.year);
        market_price = market_price
            .checked_add(cf.discounted)
            .ok_or_else(|| out_of_range(terms))?;
        time_weighted = t
            .checked_mul(cf.discounted)
            .and_then(|v| time_weighted.checked_add(v))
            .ok_or_else(|| out_of_range(terms))?;
        convexity_sum = (t * (t + Decimal::ONE))
            .checked_mul(cf.discounted)
            .and_then(|v| convexity_sum.checked_add(v))
            .ok_or_else(|| out_of_range(terms))?;
    }
    if market_price <= Decimal::ZERO {
        return Err(BondRiskError::DivisionByZero {
            context: format!("pricing bond {}: non-positive price", terms.id),
        });
    }

    let macaulay_duration = time_weighted / market_price;
    let duration = macaulay_duration / one_plus_y;
    let convexity = one_plus_y
        .checked_mul(one_plus_y)
        .and_then(|g| g.checked_mul(market_price))
        .and_then(|d| convexity_sum.checked_div(d))
        .ok_or_else(|| out_of_range(terms))?;

    let pv01 = (market_price * ONE_BP)
        .checked_mul(duration)
        .ok_or_else(|| out_of_range(terms))?;
    let cr01 = match terms.bond_type {
        BondType::Corporate => pv01,
        BondType::Government => Decimal::ZERO,
    };

    Ok(PricingOutput {
        cashflows,
        market_price,
        macaulay_duration,
        duration,
        convexity,
        pv01,
        dv01: pv01,
        cr01,
    })
}

/// Annual bullet schedule discounted at `ytm` (decimal rate).
///
/// Returns `None` when a discount factor leaves the decimal range: very long
/// maturities overflow, deeply negative yields shrink the factor to zero.
pub fn build_cashflows(
    face_value: Money,
    coupon_rate: Percent,
    ytm: Rate,
    maturity_years: u32,
) -> Option<Vec<Cashflow>> {
    let coupon = face_value.checked_mul(coupon_rate)? / dec!(100);
    let one_plus_y = Decimal::ONE + ytm;

    let mut df = Decimal::ONE;
    let mut flows = Vec::with_capacity(maturity_years as usize);
    for year in 1..=maturity_years {
        df = df.checked_mul(one_plus_y)?;
        let principal = if year == maturity_years {
            face_value
        } else {
            Decimal::ZERO
        };
        let total = coupon.checked_add(principal)?;
        flows.push(Cashflow {
            year,
            coupon,
            principal,
            total,
            discounted: total.checked_div(df)?,
        });
    }
    Some(flows)
}

/// Floating-point repricing with the same convention as [`price`].
///
/// Used in the scenario loop, where thousands of reprices per run make
/// decimal arithmetic too slow. `coupon_rate` and `ytm` are decimal rates.
pub fn reprice_at_yield(face_value: f64, coupon_rate: f64, maturity_years: u32, ytm: f64) -> f64 {
    let coupon = face_value * coupon_rate;
    let one_plus_y = 1.0 + ytm;
    let mut df = 1.0_f64;
    let mut pv = 0.0_f64;
    for year in 1..=maturity_years {
        df *= one_plus_y;
        let cf = if year == maturity_years {
            coupon + face_value
        } else {
            coupon
        };
        pv += cf / df;
    }
    pv
}

/// Duration/convexity estimate of the percentage price change for a yield
/// move of `delta_y` (decimal).
pub fn price_change_estimate(duration: Decimal, convexity: Decimal, delta_y: Rate) -> Decimal {
    -duration * delta_y + dec!(0.5) * convexity * delta_y * delta_y
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn out_of_range(terms: &BondTerms) -> BondRiskError {
    BondRiskError::invalid(
        "yield_to_maturity",
        format!(
            "Bond {}: discounting at {}% over {} years exceeds decimal range.",
            terms.id, terms.yield_to_maturity, terms.maturity_years
        ),
    )
}

fn validate_terms(terms: &BondTerms) -> BondRiskResult<()> {
    if terms.maturity_years == 0 {
        return Err(BondRiskError::invalid(
            "maturity_years",
            format!("Bond {}: maturity must be at least 1 year.", terms.id),
        ));
    }
    if terms.yield_to_maturity <= dec!(-100) {
        return Err(BondRiskError::invalid(
            "yield_to_maturity",
            format!("Bond {}: YTM must be greater than -100%.", terms.id),
        ));
    }
    if terms.face_value <= Decimal::ZERO {
        return Err(BondRiskError::invalid(
            "face_value",
            format!("Bond {}: face value must be positive.", terms.id),
        ));
    }
    if terms.coupon_rate < Decimal::ZERO {
        return Err(BondRiskError::invalid(
            "coupon_rate",
            format!("Bond {}: coupon rate must be non-negative.", terms.id),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
