//! Scheduling strategies and the SOC primitives they share.
//!
//! Every solver borrows a [`ProblemParams`] read-only and returns a fresh
//! [`Schedule`]. Non-convergence is a result, not an error.

pub mod easy_shift;
pub mod heuristic;
pub mod lp;
pub mod rank;
pub mod soc;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use easy_shift::{EasyShift, ShiftOptions};
pub use heuristic::TwoPhase;
pub use lp::LpSolver;
pub use rank::TieBreak;

use crate::problem::ProblemParams;
use crate::schedule::Schedule;

/// Identifies a scheduling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Greedy constraint-repair with overflow repair and cheaper-hour deferral.
    EasyShift,
    /// Baseline + boost greedy with overflow clipping.
    Heuristic,
    /// Exact linear program.
    Lp,
}

impl SolverKind {
    /// Every strategy, in reporting order.
    pub const ALL: [SolverKind; 3] = [SolverKind::EasyShift, SolverKind::Heuristic, SolverKind::Lp];

    /// Stable lowercase name used in config files, CLI flags and output.
    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::EasyShift => "easy_shift",
            SolverKind::Heuristic => "heuristic",
            SolverKind::Lp => "lp",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolverKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown solver '{s}'. Available: easy_shift, heuristic, lp"))
    }
}

/// Common interface of the scheduling strategies.
///
/// Implementations hold only their options; all search state lives inside a
/// single call, so one value can be reused across scenarios and threads.
pub trait Scheduler {
    /// Which strategy this is.
    fn kind(&self) -> SolverKind;

    /// Solves from the strategy's default starting point.
    fn solve(&self, params: &ProblemParams) -> Schedule;

    /// Solves starting from `start` instead of the default starting point.
    ///
    /// Re-solving from a converged schedule's own output returns that output
    /// unchanged. Strategies without a notion of a starting point ignore
    /// `start`.
    fn solve_from(&self, params: &ProblemParams, start: &[f64]) -> Schedule {
        let _ = start;
        self.solve(params)
    }
}

/// Builds the strategy named by `kind`, configured with `options`.
///
/// `options` only affects [`EasyShift`] and the ranking of [`TwoPhase`].
pub fn scheduler_for(kind: SolverKind, options: ShiftOptions) -> Box<dyn Scheduler> {
    match kind {
        SolverKind::EasyShift => Box::new(EasyShift::new(options)),
        SolverKind::Heuristic => Box::new(TwoPhase::new(options.tie_break)),
        SolverKind::Lp => Box::new(LpSolver),
    }
}

/// Runs every strategy independently on the same parameters.
///
/// Results are returned in [`SolverKind::ALL`] order.
pub fn solve_all(params: &ProblemParams, options: ShiftOptions) -> Vec<Schedule> {
    SolverKind::ALL
        .into_iter()
        .map(|kind| scheduler_for(kind, options).solve(params))
        .collect()
}

/// Clamps a warm-start vector into `[min_input, max_input]`.
///
/// Returns `None` when the length does not match the horizon.
pub(crate) fn clamp_start(start: &[f64], params: &ProblemParams) -> Option<Vec<f64>> {
    if start.len() != params.horizon() {
        return None;
    }
    Some(
        start
            .iter()
            .zip(params.min_input().iter().zip(params.max_input()))
            .map(|(&v, (&lo, &hi))| v.max(lo).min(hi))
            .collect(),
    )
}
