//! EasyShift: greedy pre-heat assignment with storage-overflow repair and
//! cheaper-hour deferral.
//!
//! Each outer pass targets the first unsatisfied hour and fills the cheapest
//! eligible hour at or before it. Candidates are built as fresh vectors,
//! evaluated with the pure functions in [`soc`], and only then committed to
//! the working schedule.

use tracing::{debug, info, warn};

use super::rank::{TieBreak, rank_by_price};
use super::{Scheduler, SolverKind, clamp_start, soc};
use crate::problem::ProblemParams;
use crate::schedule::Schedule;

/// Candidate output levels per kWh scanned during cheaper-hour deferral.
const LEVELS_PER_KWH: f64 = 10.0;

/// Feature switches for [`EasyShift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftOptions {
    /// Enforce `max_soc`: block hours behind a full tank and repair overflow.
    pub storage_capacity: bool,
    /// Move output towards a strictly cheaper hour that the frontier just reached.
    pub cheaper_hours: bool,
    /// Ordering of equally priced hours.
    pub tie_break: TieBreak,
}

impl Default for ShiftOptions {
    fn default() -> Self {
        Self {
            storage_capacity: true,
            cheaper_hours: true,
            tie_break: TieBreak::HourIndex,
        }
    }
}

/// Per-hour output ceiling used during one solve.
///
/// Starts at `max_input` and only ever decreases, when overflow repair
/// settles an hour below its nominal maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveCap(Vec<f64>);

impl EffectiveCap {
    /// Initialises every hour at its `max_input`.
    pub fn from_params(params: &ProblemParams) -> Self {
        Self(params.max_input().to_vec())
    }

    /// Current ceiling for `hour`.
    pub fn at(&self, hour: usize) -> f64 {
        self.0[hour]
    }

    /// Lowers the ceiling for `hour`; higher values are ignored.
    pub fn lower(&mut self, hour: usize, value: f64) {
        if value < self.0[hour] {
            self.0[hour] = value;
        }
    }

    /// Ceilings for every hour.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the cap, returning the per-hour ceilings.
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

/// Outcome of overflow repair for a freshly assigned hour.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Repair {
    /// No overflow after rounding.
    Fits,
    /// Keep this reduced output and lower the hour's cap to it.
    Reduced(f64),
    /// Overflow cannot be absorbed by this hour; restore its previous output.
    Reverted,
}

/// Greedy constraint-repair scheduler.
///
/// Iteration cap is `2 * horizon` passes.
///
/// # Examples
///
/// ```
/// use hpwh_shift::problem::ProblemParams;
/// use hpwh_shift::solver::{EasyShift, Scheduler, ShiftOptions};
///
/// let params = ProblemParams::builder()
///     .horizon(4)
///     .price([0.10, 0.30, 0.05, 0.20])
///     .load([0.0, 0.0, 0.0, 5.0])
///     .max_input(5.0)
///     .max_soc(5.0)
///     .build()
///     .expect("valid parameters");
/// let schedule = EasyShift::new(ShiftOptions::default()).solve(&params);
/// assert!(schedule.converged);
/// assert_eq!(schedule.output, vec![0.0, 0.0, 5.0, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EasyShift {
    options: ShiftOptions,
}

impl EasyShift {
    pub fn new(options: ShiftOptions) -> Self {
        Self { options }
    }

    fn run(&self, params: &ProblemParams, mut output: Vec<f64>) -> Schedule {
        let mut cap = EffectiveCap::from_params(params);
        let ranked = rank_by_price(params.price(), self.options.tie_break);
        let max_iterations = 2 * params.horizon();
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > max_iterations {
                warn!(
                    iterations = max_iterations,
                    "easy_shift reached its iteration cap without converging"
                );
                return finish(output, cap, false, params);
            }

            let Some(target) = soc::first_unsatisfied(&output, params) else {
                info!(iterations = iteration, "easy_shift converged");
                return finish(output, cap, true, params);
            };
            debug!(iteration, target, "easy_shift pass");

            let mut assigned_any = false;
            for &hour in &ranked {
                if !self.is_eligible(hour, target, &output, &cap, params) {
                    continue;
                }

                let previous = output[hour];
                let mut candidate = output.clone();
                candidate[hour] = cap.at(hour);
                debug!(hour, price = params.price()[hour], output = candidate[hour], "assign");

                if self.options.storage_capacity {
                    match repair_overflow(hour, &candidate, previous, params) {
                        Repair::Fits => {}
                        Repair::Reduced(level) => {
                            debug!(hour, level, "overflow repaired by reduction");
                            candidate[hour] = level;
                            cap.lower(hour, level);
                        }
                        Repair::Reverted => {
                            debug!(hour, previous, "overflow not absorbable; reverted");
                            candidate[hour] = previous;
                        }
                    }
                }

                if self.options.cheaper_hours {
                    let level = defer_to_cheaper_hour(hour, target, &output, &candidate, &cap, params);
                    if level != candidate[hour] {
                        debug!(hour, from = candidate[hour], to = level, "deferred to cheaper hour");
                        candidate[hour] = level;
                    }
                }

                output = candidate;
                assigned_any = true;

                match soc::first_unsatisfied(&output, params) {
                    None => {
                        info!(iterations = iteration, "easy_shift converged");
                        return finish(output, cap, true, params);
                    }
                    Some(frontier) if frontier != target => {
                        debug!(from = target, to = frontier, "frontier moved");
                        break;
                    }
                    Some(_) => {}
                }
            }

            if !assigned_any {
                warn!(iteration, target, "easy_shift found no eligible hour; not converged");
                return finish(output, cap, false, params);
            }
        }
    }

    /// Pre-heat only, below the effective cap, and not behind a full tank.
    ///
    /// With storage enforcement on, an hour that feeds the first boundary
    /// whose SOC rounds to exactly `max_soc` is blocked. Boundary `k` is the
    /// charge at the start of hour `k`, so hours `1..k` are blocked; hour 0
    /// never is.
    fn is_eligible(
        &self,
        hour: usize,
        target: usize,
        output: &[f64],
        cap: &EffectiveCap,
        params: &ProblemParams,
    ) -> bool {
        if hour > target || output[hour] >= cap.at(hour) {
            return false;
        }
        if self.options.storage_capacity && hour != 0 {
            if let Some(full) = first_full_boundary(output, params) {
                return hour >= full;
            }
        }
        true
    }
}

impl Scheduler for EasyShift {
    fn kind(&self) -> SolverKind {
        SolverKind::EasyShift
    }

    /// Starts from `min_input` at every hour.
    fn solve(&self, params: &ProblemParams) -> Schedule {
        self.run(params, params.min_input().to_vec())
    }

    fn solve_from(&self, params: &ProblemParams, start: &[f64]) -> Schedule {
        match clamp_start(start, params) {
            Some(start) => self.run(params, start),
            None => {
                warn!(
                    len = start.len(),
                    horizon = params.horizon(),
                    "warm start length mismatch; starting from min_input"
                );
                self.solve(params)
            }
        }
    }
}

fn finish(output: Vec<f64>, cap: EffectiveCap, converged: bool, params: &ProblemParams) -> Schedule {
    Schedule::assemble(SolverKind::EasyShift, output, cap.into_vec(), converged, params)
}

/// First SOC boundary whose value rounds to exactly `max_soc`.
fn first_full_boundary(output: &[f64], params: &ProblemParams) -> Option<usize> {
    soc::simulate(output, params)
        .into_iter()
        .position(|s| soc::round1(s) == params.max_soc())
}

/// Overflow is measured over the whole trace and rounded to one decimal.
fn repair_overflow(hour: usize, candidate: &[f64], previous: f64, params: &ProblemParams) -> Repair {
    let overflow = soc::round1(soc::max_overflow(candidate, params));
    if overflow == 0.0 {
        return Repair::Fits;
    }
    let reduced = candidate[hour] - overflow;
    if reduced > params.min_input()[hour] && reduced > previous {
        Repair::Reduced(reduced)
    } else {
        Repair::Reverted
    }
}

/// Picks the output level for `hour` that leaves the least charge in the tank
/// just before a strictly cheaper hour in the newly satisfied window.
///
/// `before` is the schedule prior to this assignment, `candidate` the schedule
/// after overflow repair. Returns the candidate's level unchanged when the
/// frontier did not advance, no cheaper hour exists, or no scanned level passes.
fn defer_to_cheaper_hour(
    hour: usize,
    target: usize,
    before: &[f64],
    candidate: &[f64],
    cap: &EffectiveCap,
    params: &ProblemParams,
) -> f64 {
    let current = candidate[hour];
    let new_target = match soc::first_unsatisfied(candidate, params) {
        Some(frontier) if frontier > target => frontier,
        _ => return current,
    };

    let prices = params.price();
    let Some(cheaper) = (target..=new_target).find(|&h| prices[h] < prices[hour]) else {
        return current;
    };

    let floor = params.min_input()[hour];
    let ceiling = cap.at(hour);
    let first_step = (floor * LEVELS_PER_KWH - 1e-9).ceil() as i64;
    let last_step = (ceiling * LEVELS_PER_KWH + 1e-9).floor() as i64;
    // Reserve the cheaper hour must still be able to cover at its own maximum.
    let needed = params.load()[cheaper] + params.min_soc() - params.max_input()[cheaper];

    let mut best = current;
    let mut best_soc = f64::INFINITY;
    for step in first_step..=last_step {
        let level = (step as f64 / LEVELS_PER_KWH).clamp(floor, ceiling);
        let mut trial = before.to_vec();
        trial[hour] = level;

        if cheaper > 0 && !soc::satisfied_through(&trial, params, cheaper - 1) {
            continue;
        }
        let soc_before_cheaper = soc::simulate(&trial, params)[cheaper];
        // Charges within `SOC_EPSILON` of the reserve count as equal to it.
        if needed + soc::SOC_EPSILON >= soc_before_cheaper {
            continue;
        }
        if soc_before_cheaper < best_soc {
            best_soc = soc_before_cheaper;
            best = level;
        }
    }
    best
}
