//! Tank state-of-charge simulation and feasibility primitives shared by every solver.
//!
//! Everything here is a pure function of an output vector and the problem
//! parameters. Traces are recomputed on every call and never cached.

use crate::problem::ProblemParams;

/// Slack (kWh) allowed when comparing charge against demand, so that
/// schedules which meet a load exactly are not rejected for float drift.
pub const SOC_EPSILON: f64 = 1e-9;

/// Forward-simulates tank charge for `output`.
///
/// Returns `horizon + 1` boundary values:
/// `soc[0] = initial_soc`, `soc[h + 1] = soc[h] + output[h] - load[h]`.
/// No clamping is applied; overflow and deficit show up as-is.
///
/// # Examples
///
/// ```
/// use hpwh_shift::problem::ProblemParams;
/// use hpwh_shift::solver::soc::simulate;
///
/// let params = ProblemParams::builder()
///     .horizon(2)
///     .price([0.1, 0.1])
///     .load([1.0, 2.0])
///     .max_input(5.0)
///     .max_soc(10.0)
///     .initial_soc(1.0)
///     .build()
///     .expect("valid parameters");
/// assert_eq!(simulate(&[3.0, 0.0], &params), vec![1.0, 3.0, 1.0]);
/// ```
pub fn simulate(output: &[f64], params: &ProblemParams) -> Vec<f64> {
    let load = params.load();
    let mut soc = Vec::with_capacity(params.horizon() + 1);
    let mut level = params.initial_soc();
    soc.push(level);
    for h in 0..params.horizon() {
        level = level + output[h] - load[h];
        soc.push(level);
    }
    soc
}

/// Returns the first hour whose load cannot be met while keeping the reserve.
///
/// Hour `h` is satisfied iff `soc + output[h] + SOC_EPSILON >= load[h] + min_soc`. The walk
/// stops at the first failure; energy drawn by earlier satisfied hours is
/// unavailable to later ones. `None` means every hour is satisfied.
pub fn first_unsatisfied(output: &[f64], params: &ProblemParams) -> Option<usize> {
    let load = params.load();
    let min_soc = params.min_soc();
    let mut soc = params.initial_soc();
    for h in 0..params.horizon() {
        if soc + output[h] + SOC_EPSILON >= load[h] + min_soc {
            soc = soc + output[h] - load[h];
        } else {
            return Some(h);
        }
    }
    None
}

/// `true` when every hour up to and including `hour` is satisfied.
pub fn satisfied_through(output: &[f64], params: &ProblemParams, hour: usize) -> bool {
    first_unsatisfied(output, params).is_none_or(|first| first > hour)
}

/// Largest amount by which the SOC trace exceeds `max_soc`, or 0.0.
pub fn max_overflow(output: &[f64], params: &ProblemParams) -> f64 {
    let max_soc = params.max_soc();
    simulate(output, params)
        .into_iter()
        .fold(0.0_f64, |worst, s| worst.max(s - max_soc))
}

/// Clips `output` so the tank never rises above `max_soc`.
///
/// Single left-to-right pass: each hour is capped at its headroom
/// `max_soc - soc + load[h]`, floored at zero, and the running SOC advances
/// with the clipped value. Returns a new vector.
pub fn clip_overflow(output: &[f64], params: &ProblemParams) -> Vec<f64> {
    let load = params.load();
    let max_soc = params.max_soc();
    let mut soc = params.initial_soc();
    output
        .iter()
        .zip(load)
        .map(|(&out, &demand)| {
            let headroom = max_soc - soc + demand;
            let clipped = out.min(headroom).max(0.0);
            soc = soc + clipped - demand;
            clipped
        })
        .collect()
}

/// Rounds to one decimal place, half away from zero.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
