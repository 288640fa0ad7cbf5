use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::weights::PositionedBond;
use crate::bonds::types::BondType;
use crate::types::{Money, Percent};

/// Holdings in one category (a sector or a rating).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub category: String,
    pub market_value: Money,
    /// Share of total market value, percent
    pub weight_pct: Percent,
    pub count: usize,
}

/// Aggregate risk view over positioned bonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_market_value: Money,
    /// Held government positions (market value > 0)
    pub government_count: usize,
    /// Held corporate positions (market value > 0)
    pub corporate_count: usize,
    /// Market-value-weighted modified duration
    pub weighted_duration: Decimal,
    pub weighted_convexity: Decimal,
    /// Market-value-weighted yield to maturity, percent
    pub weighted_yield: Percent,
    pub total_pv01: Money,
    pub total_dv01: Money,
    pub total_cr01: Money,
    pub total_expected_loss: Money,
    pub sector_breakdown: Vec<BreakdownEntry>,
    pub rating_breakdown: Vec<BreakdownEntry>,
}

/// Aggregate positions into portfolio statistics.
///
/// Weighted averages use market value weights and are 0 for an empty or
/// zero-valued portfolio. Breakdowns list categories with non-zero holdings
/// in the order they are first encountered.
pub fn calculate_portfolio_summary(positions: &[PositionedBond]) -> PortfolioSummary {
    let total_market_value: Money = positions.iter().map(|p| p.market_value).sum();

    let mut summary = PortfolioSummary {
        total_market_value,
        government_count: 0,
        corporate_count: 0,
        weighted_duration: Decimal::ZERO,
        weighted_convexity: Decimal::ZERO,
        weighted_yield: Decimal::ZERO,
        total_pv01: Decimal::ZERO,
        total_dv01: Decimal::ZERO,
        total_cr01: Decimal::ZERO,
        total_expected_loss: Decimal::ZERO,
        sector_breakdown: Vec::new(),
        rating_breakdown: Vec::new(),
    };

    let mut sectors = Breakdown::default();
    let mut ratings = Breakdown::default();

    for p in positions {
        summary.total_pv01 += p.pv01;
        summary.total_dv01 += p.dv01;
        summary.total_cr01 += p.cr01;
        summary.total_expected_loss += p.expected_loss;

        if p.market_value <= Decimal::ZERO {
            continue;
        }

        match p.bond.bond_type() {
            BondType::Government => summary.government_count += 1,
            BondType::Corporate => summary.corporate_count += 1,
        }

        // mv / total is exactly 1 for a single holding, so its duration passes through unchanged.
        let share = p.market_value / total_market_value;
        summary.weighted_duration += p.bond.metrics.duration * share;
        summary.weighted_convexity += p.bond.metrics.convexity * share;
        summary.weighted_yield += p.bond.terms.yield_to_maturity * share;

        sectors.add(p.bond.terms.sector.as_str(), p.market_value);
        ratings.add(p.bond.terms.rating.as_str(), p.market_value);
    }

    summary.sector_breakdown = sectors.finish(total_market_value);
    summary.rating_breakdown = ratings.finish(total_market_value);
    summary
}

#[derive(Default)]
struct Breakdown {
    index: HashMap<String, usize>,
    entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    fn add(&mut self, category: &str, market_value: Money) {
        match self.index.get(category) {
            Some(&i) => {
                self.entries[i].market_value += market_value;
                self.entries[i].count += 1;
            }
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push(BreakdownEntry {
                    category: category.to_string(),
                    market_value,
                    weight_pct: Decimal::ZERO,
                    count: 1,
                });
            }
        }
    }

    fn finish(mut self, total: Money) -> Vec<BreakdownEntry> {
        if !total.is_zero() {
            for e in &mut self.entries {
                e.weight_pct = e.market_value * dec!(100) / total;
            }
        }
        self.entries
    }
}
