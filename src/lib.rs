//! Least-cost hourly scheduling for heat-pump water heaters.
//!
//! Three interchangeable solvers ([`solver::EasyShift`], [`solver::TwoPhase`],
//! [`solver::LpSolver`]) share the SOC simulation and feasibility primitives in
//! [`solver::soc`]. Solved schedules can be turned into CTA-2045 command
//! sequences with [`signal`].

pub mod cli;
pub mod config;
pub mod io;
pub mod problem;
pub mod report;
/// Solved schedules and their summary metrics.
pub mod schedule;
pub mod signal;
pub mod solver;
pub mod telemetry;
