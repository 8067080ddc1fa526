//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

use crate::config::SolverSelection;
use crate::signal::SignalMode;

/// Parsed command-line options. Flags left unset defer to the scenario file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub solver: Option<SolverSelection>,
    pub signals: Option<SignalMode>,
    pub csv_out: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses arguments (without the program name).
///
/// `--scenario` and `--preset` are mutually exclusive; with neither the
/// `demo` preset is selected.
///
/// # Errors
///
/// Returns a message describing the first invalid, repeated or unknown argument.
pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--solver" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --solver (expected easy_shift, heuristic, lp or all)",
                )?;
                opts.solver = Some(name.parse()?);
            }
            "--signals" => {
                i += 1;
                let mode =
                    args.next_or_err(i, "missing value for --signals (expected output or price)")?;
                opts.signals = Some(mode.parse()?);
            }
            "--csv-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --csv-out (expected a file path)")?;
                if opts.csv_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--csv-out provided more than once".to_string());
                }
            }
            "--json" => opts.json = true,
            "--verbose" | "-v" => opts.verbose = true,
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if opts.scenario.is_none() && opts.preset.is_none() {
        opts.preset = Some("demo".to_string());
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn usage() -> &'static str {
    "hpwh-shift: least-cost heat-pump water heater scheduling

Usage: hpwh-shift [OPTIONS]

Options:
  --scenario <path>     Load scenario from TOML config file
  --preset <name>       Use a built-in preset (demo, tou_24h, infeasible)
  --solver <name>       easy_shift, heuristic, lp or all
  --signals <mode>      Command classifier: output or price
  --csv-out <path>      Export the schedule to CSV
  --json                Print schedules as JSON instead of tables
  --verbose, -v         Debug logging on stderr
  --help, -h            Show this help message

If no --scenario or --preset is given, the demo preset is used."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(args(&["--scenario", "scenario.toml"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("scenario.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_preset_cli() {
        let opts = parse_args_from(args(&["--preset", "tou_24h"])).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("tou_24h"));
        assert!(opts.scenario.is_none());
    }

    #[test]
    fn defaults_to_demo_preset() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("demo"));
        assert!(!opts.json && !opts.verbose && !opts.help);
    }

    #[test]
    fn scenario_and_preset_are_exclusive() {
        let err = parse_args_from(args(&["--scenario", "a.toml", "--preset", "demo"]));
        assert!(err.is_err_and(|e| e.contains("mutually exclusive")));
    }

    #[test]
    fn parses_solver_signals_and_flags() {
        let opts = parse_args_from(args(&[
            "--solver", "all", "--signals", "price", "--csv-out", "out.csv", "--json", "-v",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.solver, Some(SolverSelection::All));
        assert_eq!(opts.signals, Some(SignalMode::Price));
        assert_eq!(opts.csv_out, Some(PathBuf::from("out.csv")));
        assert!(opts.json);
        assert!(opts.verbose);
    }

    #[test]
    fn rejects_unknown_solver_and_argument() {
        assert!(parse_args_from(args(&["--solver", "simplex"])).is_err());
        assert!(parse_args_from(args(&["--fast"])).is_err());
        assert!(parse_args_from(args(&["--preset"])).is_err());
    }
}
