//! Post-hoc summary metrics for a solved schedule.

use std::fmt;

use serde::Serialize;

use super::Schedule;
use crate::problem::ProblemParams;

/// Tolerance for SOC bound checks; absorbs LP and rounding noise.
pub const SOC_TOLERANCE_KWH: f64 = 1e-6;

/// Aggregate indicators derived from a [`Schedule`] and its parameters.
///
/// Computed from the schedule's output vector, never stored alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    /// Total electrical cost ($).
    pub total_cost: f64,
    /// Total thermal output (kWh).
    pub thermal_output_kwh: f64,
    /// Total electrical input after COP conversion (kWh).
    pub electrical_input_kwh: f64,
    /// Highest tank charge at any hour boundary (kWh).
    pub peak_soc_kwh: f64,
    /// Lowest tank charge at any hour boundary (kWh).
    pub lowest_soc_kwh: f64,
    /// Boundaries above `max_soc`.
    pub overflow_count: usize,
    /// Boundaries below `min_soc`.
    pub reserve_violation_count: usize,
    /// Hours with non-zero output.
    pub hours_running: usize,
    /// Solver convergence flag.
    pub converged: bool,
}

impl ScheduleSummary {
    /// Computes all indicators for `schedule` under `params`.
    pub fn from_schedule(schedule: &Schedule, params: &ProblemParams) -> Self {
        let soc = schedule.soc_trace(params);
        let electrical_input_kwh = schedule
            .output
            .iter()
            .enumerate()
            .map(|(h, &out)| params.electrical_kwh(h, out))
            .sum();

        Self {
            total_cost: schedule.total_cost(),
            thermal_output_kwh: schedule.output.iter().sum(),
            electrical_input_kwh,
            peak_soc_kwh: soc.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            lowest_soc_kwh: soc.iter().copied().fold(f64::INFINITY, f64::min),
            overflow_count: soc
                .iter()
                .filter(|&&s| s > params.max_soc() + SOC_TOLERANCE_KWH)
                .count(),
            reserve_violation_count: soc
                .iter()
                .filter(|&&s| s < params.min_soc() - SOC_TOLERANCE_KWH)
                .count(),
            hours_running: schedule.output.iter().filter(|&&o| o > 0.0).count(),
            converged: schedule.converged,
        }
    }
}

impl fmt::Display for ScheduleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Schedule Summary ---")?;
        writeln!(f, "Converged:             {}", self.converged)?;
        writeln!(f, "Total cost:            {:.4} $", self.total_cost)?;
        writeln!(f, "Thermal output:        {:.2} kWh", self.thermal_output_kwh)?;
        writeln!(f, "Electrical input:      {:.2} kWh", self.electrical_input_kwh)?;
        writeln!(
            f,
            "SOC range:             {:.2} .. {:.2} kWh",
            self.lowest_soc_kwh, self.peak_soc_kwh
        )?;
        writeln!(f, "Hours running:         {}", self.hours_running)?;
        write!(
            f,
            "Bound violations:      {} overflow, {} reserve",
            self.overflow_count, self.reserve_violation_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverKind;

    fn params() -> ProblemParams {
        ProblemParams::builder()
            .horizon(4)
            .price([0.10, 0.30, 0.05, 0.20])
            .load([0.0, 0.0, 0.0, 5.0])
            .efficiency(2.0)
            .max_input(5.0)
            .max_soc(5.0)
            .build()
            .unwrap_or_else(|e| panic!("fixture should be valid: {e}"))
    }

    #[test]
    fn totals_and_soc_range() {
        let p = params();
        let s = Schedule::assemble(
            SolverKind::EasyShift,
            vec![0.0, 0.0, 5.0, 0.0],
            vec![5.0; 4],
            true,
            &p,
        );
        let kpi = ScheduleSummary::from_schedule(&s, &p);
        assert!((kpi.total_cost - 0.125).abs() < 1e-12);
        assert_eq!(kpi.thermal_output_kwh, 5.0);
        assert_eq!(kpi.electrical_input_kwh, 2.5);
        assert_eq!(kpi.peak_soc_kwh, 5.0);
        assert_eq!(kpi.lowest_soc_kwh, 0.0);
        assert_eq!(kpi.hours_running, 1);
        assert_eq!(kpi.overflow_count, 0);
        assert_eq!(kpi.reserve_violation_count, 0);
    }

    #[test]
    fn counts_bound_violations() {
        let p = params();
        let s = Schedule::assemble(
            SolverKind::EasyShift,
            vec![5.0, 5.0, 0.0, 0.0],
            vec![5.0; 4],
            false,
            &p,
        );
        let kpi = ScheduleSummary::from_schedule(&s, &p);
        // trace: 0, 5, 10, 10, 5
        assert_eq!(kpi.overflow_count, 2);
        assert_eq!(kpi.reserve_violation_count, 0);
        assert!(!kpi.converged);
    }

    #[test]
    fn display_has_cost_line() {
        let p = params();
        let s = Schedule::assemble(SolverKind::Lp, vec![0.0; 4], vec![5.0; 4], false, &p);
        let text = ScheduleSummary::from_schedule(&s, &p).to_string();
        assert!(text.lines().any(|l| l.starts_with("Total cost:")));
    }
}
