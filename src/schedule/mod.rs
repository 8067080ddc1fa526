//! Solver results: output vector, per-hour electrical cost, and convergence flag.

pub mod kpi;

use std::fmt;

use serde::Serialize;

use crate::problem::ProblemParams;
use crate::solver::SolverKind;
use crate::solver::soc;

/// Schedule returned by every solver.
///
/// Built once per solve call by [`Schedule::assemble`] and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    /// Solver that produced this schedule.
    pub solver: SolverKind,
    /// Thermal output per hour (kWh).
    pub output: Vec<f64>,
    /// Per-hour cap in force when the solver stopped (kWh). Equals
    /// `max_input` unless overflow repair lowered it.
    pub effective_cap: Vec<f64>,
    /// Electrical cost per hour ($).
    pub cost: Vec<f64>,
    /// `true` when every hour's load is met under `output`.
    pub converged: bool,
}

impl Schedule {
    /// Assembles a schedule, pricing each hour at
    /// `output[h] * price[h] / efficiency[h]`.
    ///
    /// Hours with a non-positive COP are priced without the division.
    pub fn assemble(
        solver: SolverKind,
        output: Vec<f64>,
        effective_cap: Vec<f64>,
        converged: bool,
        params: &ProblemParams,
    ) -> Self {
        let cost = output
            .iter()
            .enumerate()
            .map(|(h, &out)| out * params.cost_per_thermal_kwh(h))
            .collect();
        Self {
            solver,
            output,
            effective_cap,
            cost,
            converged,
        }
    }

    /// Number of scheduled hours.
    pub fn horizon(&self) -> usize {
        self.output.len()
    }

    /// Sum of per-hour electrical cost ($).
    pub fn total_cost(&self) -> f64 {
        self.cost.iter().sum()
    }

    /// Tank charge at every hour boundary under this schedule.
    pub fn soc_trace(&self, params: &ProblemParams) -> Vec<f64> {
        soc::simulate(&self.output, params)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | converged={} | total=${:.4} | output=[",
            self.solver,
            self.converged,
            self.total_cost()
        )?;
        for (h, out) in self.output.iter().enumerate() {
            if h > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{out:.2}")?;
        }
        write!(f, "]")
    }
}
