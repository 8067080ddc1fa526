//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use hpwh_shift::config::ScenarioConfig;
use hpwh_shift::problem::ProblemParams;

/// Absolute tolerance for LP results.
pub const LP_TOLERANCE: f64 = 1e-6;

/// Four-hour demo: one 5 kWh draw at hour 3, cheapest pre-heat at hour 2.
pub fn demo_params() -> ProblemParams {
    preset_params("demo")
}

/// One hour with a 10 kWh draw against a 5 kWh heater and no tank.
pub fn infeasible_params() -> ProblemParams {
    preset_params("infeasible")
}

/// Full day on a time-of-use tariff with a 12 kWh tank and per-hour COP.
pub fn tou_params() -> ProblemParams {
    preset_params("tou_24h")
}

/// Parameters of a built-in preset.
pub fn preset_params(name: &str) -> ProblemParams {
    ScenarioConfig::from_preset(name)
        .unwrap_or_else(|e| panic!("preset {name} should load: {e}"))
        .to_params()
        .unwrap_or_else(|e| panic!("preset {name} should be valid: {e}"))
}

/// Flat-priced problem with scalar bounds.
pub fn flat_params(load: &[f64], max_input: f64, initial: f64, max_soc: f64) -> ProblemParams {
    ProblemParams::builder()
        .horizon(load.len())
        .price(vec![0.15; load.len()])
        .load(load)
        .max_input(max_input)
        .initial_soc(initial)
        .max_soc(max_soc)
        .build()
        .unwrap_or_else(|e| panic!("fixture should be valid: {e}"))
}

/// Asserts two output vectors agree element-wise within `tol`.
pub fn assert_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len(), "length mismatch: {got:?} vs {want:?}");
    for (h, (g, w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() <= tol, "hour {h}: got {g}, want {w} ({got:?})");
    }
}
