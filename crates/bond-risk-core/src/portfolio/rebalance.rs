use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use super::weights::{normalize_weights, WeightMap};
use crate::analytics::price_universe;
use crate::bonds::types::{Bond, BondTerms};
use crate::error::BondRiskError;
use crate::types::{with_metadata, ComputationOutput, Percent};
use crate::BondRiskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named tilt of the portfolio towards a subset of bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceAction {
    /// Maturity <= 5 years
    IncreaseShortDated,
    /// Maturity >= 10 years
    IncreaseLongDated,
    /// Rated BBB- or better
    IncreaseInvestmentGrade,
    /// Rated below BBB- (unrated included)
    IncreaseLowerRatedDebt,
}

impl RebalanceAction {
    pub const ALL: [RebalanceAction; 4] = [
        RebalanceAction::IncreaseShortDated,
        RebalanceAction::IncreaseLongDated,
        RebalanceAction::IncreaseInvestmentGrade,
        RebalanceAction::IncreaseLowerRatedDebt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceAction::IncreaseShortDated => "increase_short_dated",
            RebalanceAction::IncreaseLongDated => "increase_long_dated",
            RebalanceAction::IncreaseInvestmentGrade => "increase_investment_grade",
            RebalanceAction::IncreaseLowerRatedDebt => "increase_lower_rated_debt",
        }
    }

    /// Whether a bond belongs to the subset this action buys into.
    pub fn targets(&self, terms: &BondTerms) -> bool {
        match self {
            RebalanceAction::IncreaseShortDated => terms.maturity_years <= 5,
            RebalanceAction::IncreaseLongDated => terms.maturity_years >= 10,
            RebalanceAction::IncreaseInvestmentGrade => terms.rating.is_investment_grade(),
            RebalanceAction::IncreaseLowerRatedDebt => !terms.rating.is_investment_grade(),
        }
    }
}

impl fmt::Display for RebalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalanceAction {
    type Err = BondRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RebalanceAction::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| {
                BondRiskError::invalid(
                    "action",
                    format!(
                        "Unknown rebalance action '{s}'. Use: increase_short_dated, \
                         increase_long_dated, increase_investment_grade, increase_lower_rated_debt"
                    ),
                )
            })
    }
}

/// Envelope input for a rebalance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceInput {
    pub bonds: Vec<BondTerms>,
    #[serde(default)]
    pub weights: WeightMap,
    pub action: RebalanceAction,
    /// Percentage points to move into the target subset, 0..=100
    pub shift_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceOutput {
    pub action: RebalanceAction,
    /// Rebalanced weights, not renormalized
    pub weights: WeightMap,
    /// Rebalanced weights after normalization
    pub normalized_weights: WeightMap,
    pub target_weight_before: Percent,
    pub target_weight_after: Percent,
    /// Shift actually applied after capping
    pub applied_shift: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Move up to `shift_percent` points of weight from the complement of the
/// action's target subset into the subset.
///
/// Target weights grow in proportion to their current share (evenly if the
/// subset holds nothing); complement weights shrink in proportion. The shift
/// is capped by the complement's weight and by `100 - target weight`, so no
/// weight goes negative. An empty bond list, empty subset or empty
/// complement returns the input unchanged. The output is not renormalized.
pub fn rebalance(
    bonds: &[Bond],
    weights: &WeightMap,
    action: RebalanceAction,
    shift_percent: Percent,
) -> BondRiskResult<WeightMap> {
    Ok(rebalance_detailed(bonds, weights, action, shift_percent)?.0)
}

/// [`rebalance`] plus the shift that was actually applied.
fn rebalance_detailed(
    bonds: &[Bond],
    weights: &WeightMap,
    action: RebalanceAction,
    shift_percent: Percent,
) -> BondRiskResult<(WeightMap, Percent)> {
    if shift_percent < Decimal::ZERO || shift_percent > dec!(100) {
        return Err(BondRiskError::invalid(
            "shift_percent",
            format!("Shift must be within [0, 100], got {shift_percent}."),
        ));
    }

    let current = |id: u32| {
        weights
            .get(&id)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    };

    let (target, complement): (Vec<&Bond>, Vec<&Bond>) =
        bonds.iter().partition(|b| action.targets(&b.terms));
    if target.is_empty() || complement.is_empty() {
        debug!(%action, "rebalance is a no-op: empty subset");
        return Ok((weights.clone(), Decimal::ZERO));
    }

    let target_total: Decimal = target.iter().map(|b| current(b.id())).sum();
    let complement_total: Decimal = complement.iter().map(|b| current(b.id())).sum();

    let delta = shift_percent
        .min(complement_total)
        .min(dec!(100) - target_total)
        .max(Decimal::ZERO);
    if delta.is_zero() {
        return Ok((weights.clone(), Decimal::ZERO));
    }

    let mut out = weights.clone();
    for b in &complement {
        let w = current(b.id());
        let reduced = (w - delta * w / complement_total).max(Decimal::ZERO);
        out.insert(b.id(), reduced);
    }
    let even_share = delta / Decimal::from(target.len() as u64);
    for b in &target {
        let w = current(b.id());
        let increased = if target_total.is_zero() {
            w + even_share
        } else {
            w + delta * w / target_total
        };
        out.insert(b.id(), increased);
    }

    debug!(%action, %delta, "rebalanced weights");
    Ok((out, delta))
}

/// Price the bonds, rebalance and report before/after subset weights.
pub fn calculate_rebalance(
    input: &RebalanceInput,
) -> BondRiskResult<ComputationOutput<RebalanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let bonds = price_universe(&input.bonds)?;
    let (weights, applied_shift) =
        rebalance_detailed(&bonds, &input.weights, input.action, input.shift_percent)?;

    if applied_shift < input.shift_percent {
        warnings.push(format!(
            "Requested shift of {} capped to {} by available weight",
            input.shift_percent, applied_shift
        ));
    }

    let subset_weight = |w: &WeightMap| -> Percent {
        bonds
            .iter()
            .filter(|b| input.action.targets(&b.terms))
            .map(|b| w.get(&b.id()).copied().unwrap_or(Decimal::ZERO).max(Decimal::ZERO))
            .sum()
    };

    let output = RebalanceOutput {
        action: input.action,
        target_weight_before: subset_weight(&input.weights),
        target_weight_after: subset_weight(&weights),
        normalized_weights: normalize_weights(&weights, &bonds),
        weights,
        applied_shift,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Proportional subset rebalance",
        &serde_json::json!({
            "action": input.action.as_str(),
            "shift_percent": input.shift_percent.to_string(),
            "bonds": input.bonds.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonds::generator::generate;
    use crate::portfolio::weights::{build_equal_weights, total_weight};

    fn subset_weight(bonds: &[Bond], w: &WeightMap, action: RebalanceAction) -> Decimal {
        bonds
            .iter()
            .filter(|b| action.targets(&b.terms))
            .map(|b| w.get(&b.id()).copied().unwrap_or(Decimal::ZERO))
            .sum()
    }

    #[test]
    fn test_action_names_parse() {
        for a in RebalanceAction::ALL {
            assert_eq!(a.as_str().parse::<RebalanceAction>().unwrap(), a);
        }
        assert!("increase_everything".parse::<RebalanceAction>().is_err());
        let a: RebalanceAction = serde_json::from_str("\"increase_long_dated\"").unwrap();
        assert_eq!(a, RebalanceAction::IncreaseLongDated);
    }

    #[test]
    fn test_short_dated_shift_increases_subset() {
        let bonds = generate(42, 50).unwrap();
        let w = build_equal_weights(&bonds);
        let action = RebalanceAction::IncreaseShortDated;
        let before = subset_weight(&bonds, &w, action);
        let after_map = rebalance(&bonds, &w, action, dec!(10)).unwrap();
        let after = subset_weight(&bonds, &after_map, action);
        assert!(after > before, "before={before} after={after}");
        assert!((after - before - dec!(10)).abs() < dec!(0.0000001));
        // Weight is moved, not created
        assert!((total_weight(&after_map) - dec!(100)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_no_weight_goes_negative_when_shift_exceeds_complement() {
        let bonds = generate(42, 30).unwrap();
        let w = build_equal_weights(&bonds);
        let action = RebalanceAction::IncreaseInvestmentGrade;
        let out = rebalance(&bonds, &w, action, dec!(100)).unwrap();
        assert!(out.values().all(|v| *v >= Decimal::ZERO));
        let target = subset_weight(&bonds, &out, action);
        assert!(target <= dec!(100) + dec!(0.0000001));
    }

    #[test]
    fn test_empty_target_subset_is_no_op() {
        let bonds: Vec<Bond> = generate(42, 30)
            .unwrap()
            .into_iter()
            .filter(|b| b.maturity_years() > 5)
            .collect();
        let w = build_equal_weights(&bonds);
        let out = rebalance(&bonds, &w, RebalanceAction::IncreaseShortDated, dec!(10)).unwrap();
        assert_eq!(out, w);
    }

    #[test]
    fn test_empty_bond_list_returns_input() {
        let w: WeightMap = [(1, dec!(40)), (2, dec!(60))].into();
        let out = rebalance(&[], &w, RebalanceAction::IncreaseLongDated, dec!(10)).unwrap();
        assert_eq!(out, w);
    }

    #[test]
    fn test_zero_target_weight_spreads_evenly() {
        let bonds = generate(42, 20).unwrap();
        let action = RebalanceAction::IncreaseLongDated;
        // Put everything in the complement
        let w: WeightMap = bonds
            .iter()
            .filter(|b| !action.targets(&b.terms))
            .map(|b| (b.id(), dec!(1)))
            .collect();
        let out = rebalance(&bonds, &w, action, dec!(5)).unwrap();
        let targets: Vec<Decimal> = bonds
            .iter()
            .filter(|b| action.targets(&b.terms))
            .map(|b| out[&b.id()])
            .collect();
        assert!(!targets.is_empty());
        assert!(targets.windows(2).all(|p| p[0] == p[1]));
        assert!(targets[0] > Decimal::ZERO);
    }

    #[test]
    fn test_shift_out_of_range_rejected() {
        let bonds = generate(42, 10).unwrap();
        let w = build_equal_weights(&bonds);
        assert!(rebalance(&bonds, &w, RebalanceAction::IncreaseShortDated, dec!(-1)).is_err());
        assert!(rebalance(&bonds, &w, RebalanceAction::IncreaseShortDated, dec!(100.5)).is_err());
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let bonds = generate(42, 10).unwrap();
        let mut w = build_equal_weights(&bonds);
        w.insert(999, dec!(7));
        let out = rebalance(&bonds, &w, RebalanceAction::IncreaseLowerRatedDebt, dec!(5)).unwrap();
        assert_eq!(out[&999], dec!(7));
    }

    #[test]
    fn test_calculate_rebalance_reports_cap() {
        let bonds = generate(42, 30).unwrap();
        let input = RebalanceInput {
            bonds: bonds.iter().map(|b| b.terms.clone()).collect(),
            weights: build_equal_weights(&bonds),
            action: RebalanceAction::IncreaseShortDated,
            shift_percent: dec!(100),
        };
        let out = calculate_rebalance(&input).unwrap();
        assert!(out.result.applied_shift < dec!(100));
        assert!(!out.warnings.is_empty());
        assert!(out.result.target_weight_after > out.result.target_weight_before);
        assert!((total_weight(&out.result.normalized_weights) - dec!(100)).abs() < dec!(0.000000001));
    }
}
