use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::summary::{calculate_portfolio_summary, PortfolioSummary};
use super::weights::{apply_portfolio_weights, normalize_weights, PositionedBond, WeightMap};
use crate::analytics::price_universe;
use crate::bonds::types::BondTerms;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::BondRiskResult;

/// A bond list, a weight map and a portfolio size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAnalysisInput {
    pub bonds: Vec<BondTerms>,
    /// Raw weights; normalized before use. Empty means equal weights.
    #[serde(default)]
    pub weights: WeightMap,
    pub total_market_value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub weights: WeightMap,
    pub positions: Vec<PositionedBond>,
    pub summary: PortfolioSummary,
}

/// Normalize, position and summarize a portfolio in one call.
pub fn analyze_portfolio(
    input: &PortfolioAnalysisInput,
) -> BondRiskResult<ComputationOutput<PortfolioAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let bonds = price_universe(&input.bonds)?;

    let unknown: Vec<String> = input
        .weights
        .keys()
        .filter(|id| !bonds.iter().any(|b| b.id() == **id))
        .map(|id| id.to_string())
        .collect();
    if !unknown.is_empty() {
        warnings.push(format!(
            "Weights for unknown bond ids dropped: {}",
            unknown.join(", ")
        ));
    }
    if input.weights.values().any(|w| *w < Decimal::ZERO) {
        warnings.push("Negative weights clamped to zero".into());
    }
    let held: Decimal = input
        .weights
        .values()
        .copied()
        .map(|w| w.max(Decimal::ZERO))
        .sum();
    if held.is_zero() && !bonds.is_empty() {
        warnings.push("No positive weights supplied; using equal weights".into());
    }

    let weights = normalize_weights(&input.weights, &bonds);
    let positions = apply_portfolio_weights(&bonds, &weights, input.total_market_value)?;
    let summary = calculate_portfolio_summary(&positions);

    let output = PortfolioAnalysis {
        weights,
        positions,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Market-value weighted bond portfolio aggregation",
        &serde_json::json!({
            "bonds": input.bonds.len(),
            "total_market_value": input.total_market_value.to_string(),
            "discounting": "annual compounding, no day count",
            "pv01": "analytic (modified duration * price * 1bp)",
        }),
        warnings,
        elapsed,
        output,
    ))
}
