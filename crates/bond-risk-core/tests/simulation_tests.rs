#![cfg(feature = "simulation")]

use bond_risk_core::bonds::generator::{generate, generate_terms};
use bond_risk_core::monte_carlo::{SimulationInput, SimulationParams};
use bond_risk_core::portfolio::weights::build_equal_weights;
use bond_risk_core::{
    apply_portfolio_weights, run_simulation, simulate, simulate_cancellable, PositionedBond,
    SimulationRun, WeightMap,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;

fn reference_portfolio() -> Vec<PositionedBond> {
    let bonds = generate(42, 50).unwrap();
    let weights = build_equal_weights(&bonds);
    apply_portfolio_weights(&bonds, &weights, dec!(50000000)).unwrap()
}

#[test]
fn test_simulation_reproducible_for_seed() {
    let positions = reference_portfolio();
    let params = SimulationParams::default();
    let a = simulate(&positions, 1000, 123, &params).unwrap();
    let b = simulate(&positions, 1000, 123, &params).unwrap();
    assert_eq!(a.var95, b.var95);
    assert_eq!(a.var99, b.var99);
    assert_eq!(a.cvar95, b.cvar95);
    assert_eq!(a.mean_pnl, b.mean_pnl);
}

#[test]
fn test_risk_measures_are_ordered() {
    let r = simulate(&reference_portfolio(), 1000, 123, &SimulationParams::default()).unwrap();
    assert!(r.var95 >= 0.0);
    assert!(r.var99 >= r.var95);
    assert!(r.cvar95 >= r.var95);
    assert!(r.std_dev > 0.0);
    assert!((r.base_value - 50_000_000.0).abs() < 1e-2);
}

#[test]
fn test_cancellation_reports_incomplete() {
    let cancel = AtomicBool::new(true);
    let run = simulate_cancellable(
        &reference_portfolio(),
        1000,
        123,
        &SimulationParams::default(),
        &cancel,
    )
    .unwrap();
    assert!(matches!(
        run,
        SimulationRun::Incomplete {
            requested: 1000,
            ..
        }
    ));
}

#[test]
fn test_run_simulation_from_terms() {
    let input = SimulationInput {
        bonds: generate_terms(42, 20).unwrap(),
        weights: WeightMap::new(),
        total_market_value: dec!(10000000),
        scenario_count: 50,
        seed: 9,
        params: SimulationParams::default(),
    };
    let out = run_simulation(&input).unwrap();
    assert_eq!(out.metadata.precision, "ieee754_f64");
    assert_eq!(out.result.scenario_count, 50);
    assert!(out.warnings.iter().any(|w| w.contains("50 scenarios")));
}

#[test]
fn test_zero_scenarios_is_input_error() {
    let err = simulate(&reference_portfolio(), 0, 1, &SimulationParams::default()).unwrap_err();
    assert!(err.to_string().contains("scenario_count"));
}

#[test]
fn test_higher_volatility_widens_tail() {
    let positions = reference_portfolio();
    let calm = SimulationParams::default();
    let mut stressed = SimulationParams::default();
    stressed.short_rate.volatility = 0.03;
    let a = simulate(&positions, 1000, 123, &calm).unwrap();
    let b = simulate(&positions, 1000, 123, &stressed).unwrap();
    assert!(b.std_dev > a.std_dev);
}
