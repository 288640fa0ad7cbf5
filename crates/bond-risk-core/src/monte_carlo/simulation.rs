use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::copula::GaussianCopula;
use super::params::SimulationParams;
use crate::analytics::price_universe;
use crate::bonds::types::BondTerms;
use crate::error::BondRiskError;
use crate::fixed_income::pricing::reprice_at_yield;
use crate::portfolio::weights::{apply_portfolio_weights, normalize_weights, PositionedBond, WeightMap};
use crate::types::{with_metadata_f64, ComputationOutput, Money};
use crate::BondRiskResult;

/// Shocked yields never go below -99%.
const YIELD_FLOOR: f64 = -0.99;

/// Golden-ratio increment spreading scenario seeds across the u64 range.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a full portfolio simulation starting from bond terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub bonds: Vec<BondTerms>,
    /// Raw weights; normalized before use. Empty means equal weights.
    #[serde(default)]
    pub weights: WeightMap,
    pub total_market_value: Money,
    #[serde(default = "default_scenario_count")]
    pub scenario_count: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub params: SimulationParams,
}

fn default_scenario_count() -> usize {
    1000
}

fn default_seed() -> u64 {
    123
}

/// A single histogram bucket of scenario P&L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// "lo to hi"
    pub label: String,
    /// Bucket midpoint
    pub value: f64,
    pub count: usize,
}

/// Distribution of one-year portfolio P&L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// 95% value at risk, as a positive loss
    pub var95: f64,
    pub var99: f64,
    /// Mean loss beyond the 95% VaR threshold, as a positive loss
    pub cvar95: f64,
    pub mean_pnl: f64,
    pub std_dev: f64,
    pub min_pnl: f64,
    pub max_pnl: f64,
    pub base_value: f64,
    pub scenario_count: usize,
    pub mean_defaults: f64,
    pub histogram: Vec<HistogramBucket>,
}

/// Outcome of a run that may have been cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationRun {
    Complete(MonteCarloResult),
    /// Cancelled at a scenario boundary. No partial statistics are reported.
    Incomplete { completed: usize, requested: usize },
}

impl SimulationRun {
    pub fn is_complete(&self) -> bool {
        matches!(self, SimulationRun::Complete(_))
    }

    pub fn into_result(self) -> Option<MonteCarloResult> {
        match self {
            SimulationRun::Complete(r) => Some(r),
            SimulationRun::Incomplete { .. } => None,
        }
    }
}

/// One position flattened to f64 for the scenario loop.
#[derive(Debug, Clone)]
struct SimPosition {
    units: f64,
    face_value: f64,
    coupon_rate: f64,
    maturity_years: u32,
    base_ytm: f64,
    base_value: f64,
    default_value: f64,
    default_threshold: f64,
}

struct ScenarioModel {
    positions: Vec<SimPosition>,
    params: SimulationParams,
    copula: GaussianCopula,
    standard_normal: Normal,
    base_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScenarioOutcome {
    pnl: f64,
    defaults: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate one-year P&L for weighted positions.
///
/// Each scenario draws a Vasicek short-rate move, applies it as a parallel
/// shift to every yield, and draws correlated defaults from a one-factor
/// Gaussian copula. Surviving bonds are repriced at the shocked yield;
/// defaulted bonds recover `exposure * (1 - LGD)`. Scenario `i` has its own
/// RNG seeded from `(seed, i)`, so the result depends only on the inputs.
pub fn simulate(
    positions: &[PositionedBond],
    scenario_count: usize,
    seed: u64,
    params: &SimulationParams,
) -> BondRiskResult<MonteCarloResult> {
    let model = ScenarioModel::new(positions, params)?;
    validate_count(scenario_count)?;
    let outcomes = model.run(scenario_count, seed, None, cfg!(feature = "parallel"))?;
    let outcomes: Vec<ScenarioOutcome> = outcomes.into_iter().flatten().collect();
    Ok(summarize(&model, outcomes, params.histogram_buckets))
}

/// [`simulate`] with cooperative cancellation checked between scenarios.
pub fn simulate_cancellable(
    positions: &[PositionedBond],
    scenario_count: usize,
    seed: u64,
    params: &SimulationParams,
    cancel: &AtomicBool,
) -> BondRiskResult<SimulationRun> {
    let model = ScenarioModel::new(positions, params)?;
    validate_count(scenario_count)?;
    let outcomes = model.run(scenario_count, seed, Some(cancel), cfg!(feature = "parallel"))?;

    let completed = outcomes.iter().filter(|o| o.is_some()).count();
    if completed < scenario_count {
        info!(completed, requested = scenario_count, "simulation cancelled");
        return Ok(SimulationRun::Incomplete {
            completed,
            requested: scenario_count,
        });
    }
    let outcomes: Vec<ScenarioOutcome> = outcomes.into_iter().flatten().collect();
    Ok(SimulationRun::Complete(summarize(
        &model,
        outcomes,
        params.histogram_buckets,
    )))
}

/// Price the bonds, apply normalized weights and simulate.
pub fn run_simulation(
    input: &SimulationInput,
) -> BondRiskResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let bonds = price_universe(&input.bonds)?;
    if bonds.is_empty() {
        warnings.push("Empty bond universe: every scenario has zero P&L".into());
    }
    let weights = normalize_weights(&input.weights, &bonds);
    let positions = apply_portfolio_weights(&bonds, &weights, input.total_market_value)?;

    let result = simulate(&positions, input.scenario_count, input.seed, &input.params)?;

    if input.scenario_count < 100 {
        warnings.push(format!(
            "Only {} scenarios: tail estimates are unstable",
            input.scenario_count
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo portfolio P&L: Vasicek short rate with one-factor Gaussian copula defaults",
        &serde_json::json!({
            "scenario_count": input.scenario_count,
            "seed": input.seed,
            "horizon_years": 1,
            "short_rate": input.params.short_rate,
            "default_correlation": input.params.default_correlation,
            "histogram_buckets": input.params.histogram_buckets,
            "repricing": "instantaneous at shocked yield, no roll-down",
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Scenario loop
// ---------------------------------------------------------------------------

fn validate_count(scenario_count: usize) -> BondRiskResult<()> {
    if scenario_count == 0 {
        return Err(BondRiskError::invalid(
            "scenario_count",
            "At least one scenario is required.",
        ));
    }
    Ok(())
}

fn scenario_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
}

fn to_f64(value: Decimal, field: &str) -> BondRiskResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| BondRiskError::invalid(field, format!("{value} is not representable as f64.")))
}

impl ScenarioModel {
    fn new(positions: &[PositionedBond], params: &SimulationParams) -> BondRiskResult<Self> {
        params.validate()?;
        let copula = GaussianCopula::new(params.default_correlation)?;
        let standard_normal = Normal::new(0.0, 1.0).map_err(|e| BondRiskError::InvalidInput {
            field: "distribution".into(),
            reason: format!("Invalid Normal parameters: {e}"),
        })?;

        let mut sim_positions = Vec::with_capacity(positions.len());
        for p in positions {
            let terms = &p.bond.terms;
            let units = to_f64(p.units, "units")?;
            let face_value = to_f64(terms.face_value, "face_value")?;
            let coupon_rate = to_f64(terms.coupon_rate, "coupon_rate")? / 100.0;
            let base_ytm = to_f64(terms.yield_to_maturity, "yield_to_maturity")? / 100.0;
            let pd = to_f64(p.bond.metrics.pd, "pd")? / 100.0;
            let lgd = to_f64(p.bond.metrics.lgd, "lgd")? / 100.0;

            let base_value =
                units * reprice_at_yield(face_value, coupon_rate, terms.maturity_years, base_ytm);
            sim_positions.push(SimPosition {
                units,
                face_value,
                coupon_rate,
                maturity_years: terms.maturity_years,
                base_ytm,
                base_value,
                default_value: base_value * (1.0 - lgd),
                default_threshold: copula.threshold(pd),
            });
        }
        let base_value = sim_positions.iter().map(|p| p.base_value).sum();

        debug!(
            positions = sim_positions.len(),
            base_value, "scenario model built"
        );
        Ok(Self {
            positions: sim_positions,
            params: *params,
            copula,
            standard_normal,
            base_value,
        })
    }

    fn scenario(&self, seed: u64, index: usize) -> ScenarioOutcome {
        let mut rng = StdRng::seed_from_u64(scenario_seed(seed, index));

        let z_rate: f64 = rng.sample(self.standard_normal);
        let shift = self.params.short_rate.yield_shift(z_rate);
        let systemic: f64 = rng.sample(self.standard_normal);

        let mut value = 0.0_f64;
        let mut defaults = 0_u32;
        for p in &self.positions {
            // Draw for every position so the stream layout does not depend on holdings.
            let eps: f64 = rng.sample(self.standard_normal);
            if p.units <= 0.0 {
                continue;
            }
            if self.copula.defaults(systemic, eps, p.default_threshold) {
                defaults += 1;
                value += p.default_value;
            } else {
                let ytm = (p.base_ytm + shift).max(YIELD_FLOOR);
                value +=
                    p.units * reprice_at_yield(p.face_value, p.coupon_rate, p.maturity_years, ytm);
            }
        }

        ScenarioOutcome {
            pnl: value - self.base_value,
            defaults,
        }
    }

    /// One entry per requested scenario; `None` where cancellation stopped it.
    fn run(
        &self,
        scenario_count: usize,
        seed: u64,
        cancel: Option<&AtomicBool>,
        parallel: bool,
    ) -> BondRiskResult<Vec<Option<ScenarioOutcome>>> {
        let step = |i: usize| -> Option<ScenarioOutcome> {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return None;
            }
            Some(self.scenario(seed, i))
        };

        if parallel {
            #[cfg(feature = "parallel")]
            {
                return Ok((0..scenario_count).into_par_iter().map(step).collect());
            }
        }

        let mut outcomes = Vec::with_capacity(scenario_count);
        for i in 0..scenario_count {
            match step(i) {
                Some(o) => outcomes.push(Some(o)),
                None => {
                    outcomes.resize(scenario_count, None);
                    break;
                }
            }
        }
        Ok(outcomes)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn summarize(
    model: &ScenarioModel,
    outcomes: Vec<ScenarioOutcome>,
    histogram_buckets: usize,
) -> MonteCarloResult {
    let n = outcomes.len();
    let nf = n as f64;
    let mean_defaults = outcomes.iter().map(|o| o.defaults as f64).sum::<f64>() / nf;

    let mut pnl: Vec<f64> = outcomes.into_iter().map(|o| o.pnl).collect();
    pnl.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean_pnl = pnl.iter().sum::<f64>() / nf;
    let variance = pnl.iter().map(|v| (v - mean_pnl).powi(2)).sum::<f64>() / nf;

    let idx95 = tail_index(n, 0.95);
    let idx99 = tail_index(n, 0.99);
    let threshold95 = pnl[idx95];
    let tail: Vec<f64> = pnl.iter().copied().filter(|v| *v <= threshold95).collect();
    let tail_mean = tail.iter().sum::<f64>() / tail.len() as f64;

    let result = MonteCarloResult {
        var95: (-threshold95).max(0.0),
        var99: (-pnl[idx99]).max(0.0),
        cvar95: (-tail_mean).max(0.0),
        mean_pnl,
        std_dev: variance.sqrt(),
        min_pnl: pnl[0],
        max_pnl: pnl[n - 1],
        base_value: model.base_value,
        scenario_count: n,
        mean_defaults,
        histogram: build_histogram(&pnl, histogram_buckets),
    };
    info!(
        scenarios = n,
        var95 = result.var95,
        var99 = result.var99,
        cvar95 = result.cvar95,
        "simulation complete"
    );
    result
}

/// floor((1 - c) n), clamped into the sample.
fn tail_index(n: usize, confidence: f64) -> usize {
    let idx = ((1.0 - confidence) * n as f64).floor() as usize;
    idx.min(n - 1)
}

/// Equal-width buckets from min to max over a **sorted** slice.
fn build_histogram(sorted: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    let min_val = sorted[0];
    let max_val = sorted[sorted.len() - 1];

    if (max_val - min_val).abs() < f64::EPSILON || buckets == 1 {
        return vec![HistogramBucket {
            label: bucket_label(min_val, max_val),
            value: (min_val + max_val) / 2.0,
            count: sorted.len(),
        }];
    }

    let width = (max_val - min_val) / buckets as f64;
    let mut out: Vec<HistogramBucket> = (0..buckets)
        .map(|i| {
            let lo = min_val + i as f64 * width;
            let hi = if i == buckets - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * width
            };
            HistogramBucket {
                label: bucket_label(lo, hi),
                value: (lo + hi) / 2.0,
                count: 0,
            }
        })
        .collect();

    for &v in sorted {
        let idx = (((v - min_val) / width).floor() as usize).min(buckets - 1);
        out[idx].count += 1;
    }
    out
}

fn bucket_label(lo: f64, hi: f64) -> String {
    format!("{lo:.0} to {hi:.0}")
}
