use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bonds::types::Bond;
use crate::error::BondRiskError;
use crate::types::{BondId, Money, Percent};
use crate::BondRiskResult;

/// Bond id -> weight in percent. Missing ids carry weight 0.
pub type WeightMap = BTreeMap<BondId, Percent>;

/// Allocated market values are rounded to this many decimal places so that
/// sums over positions are exact.
const MONEY_DP: u32 = 12;

/// Sums this close to 100 count as already normalized.
const NORMALIZED_TOLERANCE: Decimal = dec!(0.00000000000000000001);

/// A bond held at a given weight of a portfolio.
///
/// Per-unit ratios (yield, duration, convexity, PD) stay on `bond`; the
/// fields here are currency amounts for the allocated position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedBond {
    pub bond: Bond,
    /// Weight used for the allocation, percent
    pub weight: Percent,
    /// total_market_value * weight / 100
    pub market_value: Money,
    /// Number of bond units the allocation buys at market price
    pub units: Decimal,
    pub pv01: Money,
    pub dv01: Money,
    pub cr01: Money,
    pub expected_loss: Money,
}

/// 100/N to every bond. When N does not divide 100 the first bond takes the
/// rounding residual, so the map sums to exactly 100.
pub fn build_equal_weights(bonds: &[Bond]) -> WeightMap {
    if bonds.is_empty() {
        return WeightMap::new();
    }
    let each = dec!(100) / Decimal::from(bonds.len() as u64);
    let mut weights: WeightMap = bonds.iter().map(|b| (b.id(), each)).collect();
    absorb_residual(&mut weights);
    weights
}

/// Rescale weights so they sum to 100 across the universe.
///
/// The result has exactly one entry per bond. Negative inputs clamp to 0,
/// ids outside the universe are dropped, and an all-zero (or empty) map falls
/// back to equal weights. Normalizing a normalized map returns it unchanged.
pub fn normalize_weights(weights: &WeightMap, bonds: &[Bond]) -> WeightMap {
    if bonds.is_empty() {
        return WeightMap::new();
    }

    let clamped: WeightMap = bonds
        .iter()
        .map(|b| {
            let w = weights.get(&b.id()).copied().unwrap_or(Decimal::ZERO);
            (b.id(), w.max(Decimal::ZERO))
        })
        .collect();

    let total: Decimal = clamped.values().sum();
    if total.is_zero() {
        return build_equal_weights(bonds);
    }
    if (total - dec!(100)).abs() <= NORMALIZED_TOLERANCE {
        return clamped;
    }

    let mut scaled: WeightMap = clamped
        .into_iter()
        .map(|(id, w)| (id, w * dec!(100) / total))
        .collect();
    absorb_residual(&mut scaled);
    scaled
}

/// Sum of the weights in a map.
pub fn total_weight(weights: &WeightMap) -> Percent {
    weights.values().sum()
}

/// Allocate `total_market_value` across the bonds by weight.
///
/// Weights are used as given (normalize first). Bonds absent from the map
/// are positioned at zero; negative weights count as zero.
pub fn apply_portfolio_weights(
    bonds: &[Bond],
    weights: &WeightMap,
    total_market_value: Money,
) -> BondRiskResult<Vec<PositionedBond>> {
    if total_market_value < Decimal::ZERO {
        return Err(BondRiskError::invalid(
            "total_market_value",
            "Total market value must be non-negative.",
        ));
    }

    let held: Vec<Percent> = bonds
        .iter()
        .map(|bond| {
            weights
                .get(&bond.id())
                .copied()
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO)
        })
        .collect();
    let mut values: Vec<Money> = held
        .iter()
        .map(|w| (total_market_value * *w / dec!(100)).round_dp(MONEY_DP))
        .collect();

    // Fully invested: positions must add back to the total exactly.
    let weight_sum: Percent = held.iter().sum();
    if (weight_sum - dec!(100)).abs() <= NORMALIZED_TOLERANCE {
        if let Some(largest) = index_of_largest(&values) {
            let others: Money = values
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != largest)
                .map(|(_, v)| *v)
                .sum();
            values[largest] = total_market_value - others;
        }
    }

    bonds
        .iter()
        .zip(held.into_iter().zip(values))
        .map(|(bond, (weight, market_value))| {
            let price = bond.market_price();
            if price <= Decimal::ZERO {
                return Err(BondRiskError::DivisionByZero {
                    context: format!("positioning bond {}: non-positive price", bond.id()),
                });
            }
            let units = market_value / price;
            let m = &bond.metrics;
            Ok(PositionedBond {
                bond: bond.clone(),
                weight,
                market_value,
                units,
                pv01: m.pv01 * units,
                dv01: m.dv01 * units,
                cr01: m.cr01 * units,
                expected_loss: m.expected_loss * units,
            })
        })
        .collect()
}

/// Add `100 - sum` to the largest weight.
fn absorb_residual(weights: &mut WeightMap) {
    let residual = dec!(100) - total_weight(weights);
    if residual.is_zero() {
        return;
    }
    let largest = weights
        .iter()
        .fold(None::<(BondId, Percent)>, |best, (id, w)| match best {
            Some((_, b)) if b >= *w => best,
            _ => Some((*id, *w)),
        });
    if let Some((id, w)) = largest {
        weights.insert(id, w + residual);
    }
}

/// First index holding the maximum value.
fn index_of_largest(values: &[Money]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None::<(usize, Money)>, |best, (i, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}
