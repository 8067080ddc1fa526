//! hpwh-shift entry point: CLI wiring and config-driven solver runs.

use std::path::{Path, PathBuf};
use std::process;

use serde::Serialize;
use tracing::info;

use hpwh_shift::cli::{self, CliOptions};
use hpwh_shift::config::ScenarioConfig;
use hpwh_shift::io::export::export_csv;
use hpwh_shift::problem::ProblemParams;
use hpwh_shift::report;
use hpwh_shift::schedule::Schedule;
use hpwh_shift::schedule::kpi::ScheduleSummary;
use hpwh_shift::signal::{SignalMode, SignalSchedule};
use hpwh_shift::solver::{SolverKind, scheduler_for};
use hpwh_shift::telemetry;

/// One solver's result as printed with `--json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    schedule: &'a Schedule,
    summary: ScheduleSummary,
    signals: &'a SignalSchedule,
}

fn load_scenario(opts: &CliOptions) -> Result<ScenarioConfig, String> {
    let scenario = match (&opts.scenario, &opts.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::demo()),
    };
    let mut scenario = scenario.map_err(|e| e.to_string())?;

    if let Some(selection) = opts.solver {
        scenario.solver.kind = selection;
    }
    if let Some(mode) = opts.signals {
        scenario.signals.mode = mode;
    }
    Ok(scenario)
}

fn signals_for(schedule: &Schedule, scenario: &ScenarioConfig, params: &ProblemParams) -> SignalSchedule {
    match scenario.signals.mode {
        SignalMode::Output => SignalSchedule::from_schedule(schedule, params),
        SignalMode::Price => SignalSchedule::from_prices(params.price(), &scenario.signals.percentiles()),
    }
}

/// With several solvers, each export gets the solver name appended to the file stem.
fn csv_path(base: &Path, kind: SolverKind, multiple: bool) -> PathBuf {
    if !multiple {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("schedule");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{kind}.{ext}"),
        None => format!("{stem}_{kind}"),
    };
    base.with_file_name(name)
}

fn main() {
    let opts = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        eprintln!("{}", cli::usage());
        process::exit(1);
    });
    if opts.help {
        println!("{}", cli::usage());
        return;
    }

    let scenario = load_scenario(&opts).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    telemetry::init_tracing(opts.verbose || scenario.report.verbose);

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let params = scenario.to_params().unwrap_or_else(|e| {
        eprintln!("error: invalid parameters: {e}");
        process::exit(1);
    });

    let options = scenario.solver.shift_options();
    let start_hour = scenario.report.start_hour;
    let runs: Vec<(Schedule, SignalSchedule)> = scenario
        .solver
        .kind
        .kinds()
        .into_iter()
        .map(|kind| {
            let schedule = scheduler_for(kind, options).solve(&params);
            info!(solver = %kind, converged = schedule.converged, total_cost = schedule.total_cost(), "solve finished");
            let signals = signals_for(&schedule, &scenario, &params);
            (schedule, signals)
        })
        .collect();

    if opts.json {
        let out: Vec<RunOutput<'_>> = runs
            .iter()
            .map(|(schedule, signals)| RunOutput {
                schedule,
                summary: ScheduleSummary::from_schedule(schedule, &params),
                signals,
            })
            .collect();
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("error: failed to encode JSON: {e}");
                process::exit(1);
            }
        }
    } else {
        for (schedule, signals) in &runs {
            println!("{}", report::full_report(schedule, signals, &params, start_hour));
        }
    }

    if let Some(ref base) = opts.csv_out {
        let multiple = runs.len() > 1;
        for (schedule, signals) in &runs {
            let path = csv_path(base, schedule.solver, multiple);
            if let Err(e) = export_csv(schedule, signals, &params, start_hour, &path) {
                eprintln!("error: {e}");
                process::exit(1);
            }
            eprintln!("Schedule written to {}", path.display());
        }
    }
}
