use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

#[derive(Debug)]
struct Summary {
    converged: bool,
    total_cost: f64,
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hpwh-shift"))
        .args(args)
        .output()
        .expect("hpwh-shift process should run")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn parse_summaries(stdout: &str) -> Vec<Summary> {
    let converged = values(stdout, "Converged:");
    let costs = values(stdout, "Total cost:");
    assert_eq!(converged.len(), costs.len(), "unbalanced summaries in: {stdout}");
    converged
        .into_iter()
        .zip(costs)
        .map(|(c, cost)| Summary {
            converged: c.parse().unwrap_or_else(|_| panic!("bad Converged value `{c}`")),
            total_cost: cost
                .trim_end_matches('$')
                .trim()
                .parse()
                .unwrap_or_else(|_| panic!("bad Total cost value `{cost}`")),
        })
        .collect()
}

fn values<'a>(stdout: &'a str, label: &str) -> Vec<&'a str> {
    stdout
        .lines()
        .filter(|line| line.trim_start().starts_with(label))
        .filter_map(|line| line.split_once(':').map(|(_, right)| right.trim()))
        .collect()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hpwh-shift-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

#[test]
fn demo_preset_reports_least_cost() {
    let stdout = run_ok(&["--preset", "demo"]);
    let summaries = parse_summaries(&stdout);
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].converged);
    assert!((summaries[0].total_cost - 0.25).abs() < 1e-9, "{summaries:?}");
    assert!(stdout.contains("--- Schedule (easy_shift) ---"));
    assert!(stdout.contains("--- CTA-2045 Commands ---"));
}

#[test]
fn no_arguments_runs_demo() {
    let stdout = run_ok(&[]);
    assert!(stdout.contains("--- Schedule Summary ---"));
}

#[test]
fn infeasible_preset_exits_cleanly_without_converging() {
    let stdout = run_ok(&["--preset", "infeasible"]);
    let summaries = parse_summaries(&stdout);
    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| !s.converged), "{summaries:?}");
}

#[test]
fn scenario_files_run_via_cli() {
    let demo = parse_summaries(&run_ok(&["--scenario", "scenarios/demo.toml"]));
    assert_eq!(demo.len(), 1);
    assert!((demo[0].total_cost - 0.25).abs() < 1e-9);

    let tou = parse_summaries(&run_ok(&["--scenario", "scenarios/tou_24h.toml"]));
    assert_eq!(tou.len(), 3);

    let stdout = run_ok(&["--scenario", "scenarios/price_signals.toml"]);
    assert!(stdout.contains("Price thresholds:"));
}

#[test]
fn solver_flag_overrides_scenario() {
    let stdout = run_ok(&["--preset", "tou_24h", "--solver", "lp"]);
    assert_eq!(parse_summaries(&stdout).len(), 1);
    assert!(stdout.contains("--- Schedule (lp) ---"));
}

#[test]
fn json_output_lists_every_solver() {
    let stdout = run_ok(&["--preset", "infeasible", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    let runs = parsed.as_array().expect("top level should be an array");
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0]["schedule"]["solver"], "easy_shift");
    assert_eq!(runs[2]["schedule"]["solver"], "lp");
    assert_eq!(runs[1]["summary"]["converged"], false);
    assert_eq!(runs[0]["signals"]["commands"].as_array().map(Vec::len), Some(1));
}

#[test]
fn csv_export_writes_one_file_per_solver() {
    let dir = scratch_dir("csv");
    let base = dir.join("plan.csv");
    let base_arg = base.to_str().expect("temp path should be UTF-8");
    run_ok(&["--preset", "tou_24h", "--csv-out", base_arg]);

    for kind in ["easy_shift", "heuristic", "lp"] {
        let path = dir.join(format!("plan_{kind}.csv"));
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("missing export {}: {e}", path.display()));
        assert_eq!(text.lines().count(), 25, "{kind}: header + 24 rows");
        assert!(text.starts_with("hour,price,load_kwh,output_kwh"));
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn csv_export_single_solver_uses_given_path() {
    let dir = scratch_dir("single");
    let path = dir.join("demo.csv");
    run_ok(&["--preset", "demo", "--csv-out", path.to_str().expect("UTF-8 path")]);
    let text = fs::read_to_string(&path).expect("export should exist");
    assert_eq!(text.lines().count(), 5);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn bad_arguments_fail() {
    assert!(!run(&["--preset", "nonexistent"]).status.success());
    assert!(!run(&["--solver", "simplex"]).status.success());
    assert!(!run(&["--scenario", "a.toml", "--preset", "demo"]).status.success());
}

#[test]
fn help_prints_usage() {
    let stdout = run_ok(&["--help"]);
    assert!(stdout.contains("Usage: hpwh-shift"));
}
