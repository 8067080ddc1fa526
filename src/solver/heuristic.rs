//! Two-phase greedy baseline: lift hours to `min_input`, then boost the
//! cheapest hours to `max_input`, clipping overflow after every change.

use tracing::{debug, info, warn};

use super::rank::{TieBreak, rank_by_price};
use super::{Scheduler, SolverKind, clamp_start, soc};
use crate::problem::ProblemParams;
use crate::schedule::Schedule;

/// Baseline + boost heuristic. Iteration cap is `3 * horizon`.
///
/// Overflow clipping can leave an hour below its `min_input` when the tank has
/// no headroom for it; the clip always wins over the lower bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoPhase {
    tie_break: TieBreak,
}

impl TwoPhase {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    fn run(&self, params: &ProblemParams, start: Vec<f64>) -> Schedule {
        let start = soc::clip_overflow(&start, params);
        if soc::first_unsatisfied(&start, params).is_none() {
            info!("initial schedule already meets every hour");
            return finish(start, true, params);
        }

        let ranked = rank_by_price(params.price(), self.tie_break);
        let min_input = params.min_input();
        let max_input = params.max_input();
        let mut schedule = start;

        for iteration in 1..=3 * params.horizon() {
            let Some(target) = soc::first_unsatisfied(&schedule, params) else {
                info!(iterations = iteration - 1, "heuristic converged");
                return finish(schedule, true, params);
            };
            debug!(iteration, target, "heuristic pass");

            // Phase A: baseline every hour up to the target.
            for (out, &floor) in schedule.iter_mut().zip(min_input).take(target + 1) {
                *out = out.max(floor);
            }
            schedule = soc::clip_overflow(&schedule, params);
            match soc::first_unsatisfied(&schedule, params) {
                None => {
                    info!(iterations = iteration, "heuristic converged in baseline phase");
                    return finish(schedule, true, params);
                }
                Some(frontier) if frontier != target => {
                    debug!(from = target, to = frontier, "baseline moved frontier");
                    continue;
                }
                Some(_) => {}
            }

            // Phase B: boost the cheapest hours at or before the target.
            let mut boosted_any = false;
            for &hour in ranked.iter().filter(|&&h| h <= target) {
                if schedule[hour] >= max_input[hour] {
                    continue;
                }
                schedule[hour] = max_input[hour];
                schedule = soc::clip_overflow(&schedule, params);
                boosted_any = true;
                debug!(hour, price = params.price()[hour], output = schedule[hour], "boost");

                match soc::first_unsatisfied(&schedule, params) {
                    None => {
                        info!(iterations = iteration, "heuristic converged in boost phase");
                        return finish(schedule, true, params);
                    }
                    Some(frontier) if frontier != target => break,
                    Some(_) => {}
                }
            }

            if !boosted_any {
                warn!(target, "no hour left to boost; returning clipped max_input");
                let fallback = soc::clip_overflow(max_input, params);
                return finish(fallback, false, params);
            }
        }

        warn!(
            iterations = 3 * params.horizon(),
            "heuristic reached its iteration cap without converging"
        );
        finish(schedule, false, params)
    }
}

impl Scheduler for TwoPhase {
    fn kind(&self) -> SolverKind {
        SolverKind::Heuristic
    }

    /// Starts from `min_input`, the level Phase A would establish anyway.
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

fn finish(output: Vec<f64>, converged: bool, params: &ProblemParams) -> Schedule {
    Schedule::assemble(
        SolverKind::Heuristic,
        output,
        params.max_input().to_vec(),
        converged,
        params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        price: &[f64],
        load: &[f64],
        min_input: f64,
        max_input: f64,
        initial: f64,
        max_soc: f64,
    ) -> ProblemParams {
        ProblemParams::builder()
            .horizon(price.len())
            .price(price)
            .load(load)
            .min_input(min_input)
            .max_input(max_input)
            .initial_soc(initial)
            .max_soc(max_soc)
            .build()
            .unwrap_or_else(|e| panic!("fixture should be valid: {e}"))
    }

    #[test]
    fn boosts_cheapest_hour_before_demand() {
        let p = build(&[0.10, 0.30, 0.05, 0.20], &[0.0, 0.0, 0.0, 5.0], 0.0, 5.0, 0.0, 5.0);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged);
        assert_eq!(s.output, vec![0.0, 0.0, 5.0, 0.0]);
        assert!((s.total_cost() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn initial_charge_alone_short_circuits() {
        let p = build(&[0.1, 0.1], &[1.0, 1.0], 0.0, 5.0, 3.0, 5.0);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged);
        assert_eq!(s.output, vec![0.0, 0.0]);
    }

    #[test]
    fn baseline_phase_can_resolve_everything() {
        let p = build(&[0.1, 0.2], &[1.0, 1.0], 1.0, 5.0, 0.0, 5.0);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged);
        assert_eq!(s.output, vec![1.0, 1.0]);
    }

    #[test]
    fn boost_is_clipped_to_headroom() {
        // Tank holds 4; hour 0 can only add 4 before hour 1 draws 6.
        let p = build(&[0.05, 0.50], &[0.0, 6.0], 0.0, 5.0, 0.0, 4.0);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged);
        assert_eq!(s.output, vec![4.0, 5.0]);
        assert!(s.soc_trace(&p).iter().all(|&x| x <= 4.0));
    }

    #[test]
    fn infeasible_returns_clipped_max_input() {
        let p = build(&[0.1], &[10.0], 0.0, 5.0, 0.0, 0.0);
        let s = TwoPhase::default().solve(&p);
        assert!(!s.converged);
        assert_eq!(s.output, vec![5.0]);
    }

    #[test]
    fn warm_start_from_converged_output_is_fixed_point() {
        let p = build(&[0.05, 0.50], &[0.0, 6.0], 0.0, 5.0, 0.0, 4.0);
        let first = TwoPhase::default().solve(&p);
        let again = TwoPhase::default().solve_from(&p, &first.output);
        assert_eq!(again.output, first.output);
        assert!(again.converged);
    }

    #[test]
    fn start_is_clipped_before_fast_path() {
        // min_input alone would push the tank to 2 kWh in a 1 kWh tank.
        let p = build(&[0.1], &[0.0], 2.0, 5.0, 0.0, 1.0);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged);
        assert_eq!(s.output, vec![1.0]);
        assert!(s.soc_trace(&p).iter().all(|&x| x <= 1.0));
    }

    #[test]
    fn exact_fit_with_float_drift_converges() {
        let p = build(&[0.24, 0.23, 0.72], &[1.1, 3.3, 3.9], 0.0, 3.0, 0.0, 1.2);
        let s = TwoPhase::default().solve(&p);
        assert!(s.converged, "{:?}", s.output);
        for (got, want) in s.output.iter().zip([2.3, 3.0, 3.0]) {
            assert!((got - want).abs() < 1e-9, "{:?}", s.output);
        }
    }

    #[test]
    fn clipped_boosts_run_into_iteration_cap() {
        // Hour 0 is clipped back to zero by a full tank on every boost, and
        // hour 1 at its maximum cannot cover the draw.
        let p = ProblemParams::builder()
            .horizon(2)
            .price([0.1, 0.2])
            .load([0.0, 4.0])
            .max_input([5.0, 1.0])
            .initial_soc(2.0)
            .max_soc(2.0)
            .build()
            .unwrap_or_else(|e| panic!("fixture should be valid: {e}"));
        let s = TwoPhase::default().solve(&p);
        assert!(!s.converged);
        assert_eq!(s.output, vec![0.0, 1.0]);
        for (h, &x) in s.output.iter().enumerate() {
            assert!(x >= p.min_input()[h] && x <= p.max_input()[h]);
        }
    }

    #[test]
    fn effective_cap_is_max_input() {
        let p = build(&[0.1], &[1.0], 0.0, 3.0, 0.0, 5.0);
        assert_eq!(TwoPhase::default().solve(&p).effective_cap, vec![3.0]);
    }
}
