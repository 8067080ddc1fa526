//! Plain-text rendering of schedules and command sequences.
//!
//! Everything returns a `String`; printing is left to the binary. `start_hour`
//! only shifts the hour labels.

use std::fmt::Write;

use crate::problem::ProblemParams;
use crate::schedule::Schedule;
use crate::schedule::kpi::ScheduleSummary;
use crate::signal::SignalSchedule;

/// Per-hour table: price, load, output, end-of-hour SOC and cost.
pub fn schedule_table(schedule: &Schedule, params: &ProblemParams, start_hour: usize) -> String {
    let soc = schedule.soc_trace(params);
    let mut out = String::new();
    let _ = writeln!(out, "--- Schedule ({}) ---", schedule.solver);
    let _ = writeln!(
        out,
        "{:>5} {:>9} {:>8} {:>8} {:>8} {:>9}",
        "hour", "price", "load", "output", "soc_end", "cost"
    );
    for h in 0..schedule.horizon() {
        let _ = writeln!(
            out,
            "{:>5} {:>9.4} {:>8.2} {:>8.2} {:>8.2} {:>9.4}",
            start_hour + h,
            params.price()[h],
            params.load()[h],
            schedule.output[h],
            soc[h + 1],
            schedule.cost[h]
        );
    }
    out
}

/// Per-hour command table.
pub fn command_table(signals: &SignalSchedule, params: &ProblemParams, start_hour: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- CTA-2045 Commands ---");
    if let Some(t) = &signals.price_thresholds {
        let _ = writeln!(
            out,
            "Price thresholds: shed >= {:.4}, normal >= {:.4}, load up >= {:.4} $/kWh",
            t.shed_above, t.normal_above, t.load_up_above
        );
    }
    let _ = writeln!(out, "{:>5} {:>9} {:>5}  {}", "hour", "price", "code", "command");
    for (h, command) in signals.commands.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>5} {:>9.4} {:>5}  {}",
            start_hour + h,
            params.price()[h],
            command.code(),
            command
        );
    }
    out
}

/// Schedule table, summary block and command table, in that order.
pub fn full_report(
    schedule: &Schedule,
    signals: &SignalSchedule,
    params: &ProblemParams,
    start_hour: usize,
) -> String {
    let summary = ScheduleSummary::from_schedule(schedule, params);
    format!(
        "{}\n{summary}\n\n{}",
        schedule_table(schedule, params, start_hour),
        command_table(signals, params, start_hour)
    )
}
