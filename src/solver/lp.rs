//! Exact least-cost schedule as a bounded linear program.
//!
//! ```text
//! minimise   Σ output[h] · price[h] / cop[h]
//! subject to min_input[h] <= output[h] <= max_input[h]
//!             L · output <= max_soc - initial_soc + cumload
//!            -L · output <= initial_soc - min_soc - cumload
//! ```
//!
//! `L` is the lower-triangular all-ones matrix, so `(L · output)[h]` is the
//! cumulative output through hour `h`. Solved with `good_lp` on the pure-Rust
//! `minilp` backend.

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use tracing::{debug, info, warn};

use super::{Scheduler, SolverKind, soc};
use crate::problem::ProblemParams;
use crate::schedule::Schedule;

/// One row of `A · output <= bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    /// Dense coefficients, one per hour.
    pub coefficients: Vec<f64>,
    /// Right-hand side.
    pub bound: f64,
}

/// Builds the `2 · horizon` cumulative rows: `L` (no overflow) followed by
/// `-L` (reserve kept).
pub fn cumulative_inequalities(params: &ProblemParams) -> Vec<Inequality> {
    let n = params.horizon();
    let initial = params.initial_soc();
    let cumulative_load: Vec<f64> = params
        .load()
        .iter()
        .scan(0.0, |total, &load| {
            *total += load;
            Some(*total)
        })
        .collect();

    let triangle = |h: usize, sign: f64| -> Vec<f64> {
        (0..n).map(|j| if j <= h { sign } else { 0.0 }).collect()
    };

    let overflow_rows = cumulative_load.iter().enumerate().map(|(h, &cum)| Inequality {
        coefficients: triangle(h, 1.0),
        bound: params.max_soc() - initial + cum,
    });
    let reserve_rows = cumulative_load.iter().enumerate().map(|(h, &cum)| Inequality {
        coefficients: triangle(h, -1.0),
        bound: initial - params.min_soc() - cum,
    });
    overflow_rows.chain(reserve_rows).collect()
}

/// Exact solver. On any non-optimal outcome it falls back to `max_input`
/// clipped against overflow and reports `converged = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LpSolver;

impl Scheduler for LpSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Lp
    }

    fn solve(&self, params: &ProblemParams) -> Schedule {
        let (output, converged) = match optimise(params) {
            Ok(output) => {
                info!("lp solved to optimality");
                (output, true)
            }
            Err(err) => {
                warn!(error = %err, "lp not optimal; falling back to clipped max_input");
                (soc::clip_overflow(params.max_input(), params), false)
            }
        };
        Schedule::assemble(
            SolverKind::Lp,
            output,
            params.max_input().to_vec(),
            converged,
            params,
        )
    }
}

fn optimise(params: &ProblemParams) -> Result<Vec<f64>, ResolutionError> {
    let min_input = params.min_input();
    let max_input = params.max_input();

    let mut vars = ProblemVariables::new();
    let output: Vec<Variable> = min_input
        .iter()
        .zip(max_input)
        .map(|(&lo, &hi)| vars.add(variable().min(lo).max(hi)))
        .collect();

    let objective: Expression = output
        .iter()
        .enumerate()
        .map(|(h, &x)| params.cost_per_thermal_kwh(h) * x)
        .sum();

    let mut model = vars.minimise(objective).using(default_solver);
    for row in cumulative_inequalities(params) {
        let lhs: Expression = row
            .coefficients
            .iter()
            .zip(&output)
            .filter(|(c, _)| **c != 0.0)
            .map(|(&c, &x)| c * x)
            .sum();
        let rhs = row.bound;
        model = model.with(constraint!(lhs <= rhs));
    }
    debug!(rows = 2 * params.horizon(), "lp model built");

    let solution = model.solve()?;
    Ok(output
        .iter()
        .zip(min_input.iter().zip(max_input))
        .map(|(&x, (&lo, &hi))| solution.value(x).clamp(lo, hi))
        .collect())
}
