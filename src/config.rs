//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::problem::{HardwareKind, Hourly, ParamsError, ProblemParams};
use crate::signal::{PercentileThresholds, SignalMode};
use crate::solver::{ShiftOptions, SolverKind, TieBreak};

/// Top-level scenario configuration parsed from TOML.
///
/// `[problem]` and `[storage]` are required; every other table falls back to
/// its defaults. Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::from_preset`] for a built-in scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon, tariff, load and heater bounds.
    pub problem: ProblemConfig,
    /// Tank charge bounds.
    pub storage: StorageConfig,
    /// Solver selection and options.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Demand-response command generation.
    #[serde(default)]
    pub signals: SignalsConfig,
    /// Output presentation.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Horizon, tariff, load and heater bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemConfig {
    /// Number of hourly intervals (must be > 0).
    pub horizon: usize,
    /// Electricity price per hour ($/kWh).
    pub price: Vec<f64>,
    /// Thermal load per hour (kWh).
    pub load: Vec<f64>,
    /// COP, scalar or per hour.
    #[serde(default = "default_efficiency")]
    pub efficiency: Hourly,
    /// Minimum thermal output, scalar or per hour (kWh).
    #[serde(default = "default_min_input")]
    pub min_input: Hourly,
    /// Maximum thermal output, scalar or per hour (kWh).
    pub max_input: Hourly,
    /// `"heat_pump"` or `"resistance"`.
    #[serde(default)]
    pub hardware: HardwareKind,
}

fn default_efficiency() -> Hourly {
    Hourly::Scalar(1.0)
}

fn default_min_input() -> Hourly {
    Hourly::Scalar(0.0)
}

/// Tank charge bounds (kWh).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub initial_soc: f64,
    #[serde(default)]
    pub min_soc: f64,
    pub max_soc: f64,
}

/// Which solvers to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverSelection {
    #[default]
    EasyShift,
    Heuristic,
    Lp,
    /// Every solver, in reporting order.
    All,
}

impl SolverSelection {
    /// Solvers covered by this selection.
    pub fn kinds(self) -> Vec<SolverKind> {
        match self {
            SolverSelection::EasyShift => vec![SolverKind::EasyShift],
            SolverSelection::Heuristic => vec![SolverKind::Heuristic],
            SolverSelection::Lp => vec![SolverKind::Lp],
            SolverSelection::All => SolverKind::ALL.to_vec(),
        }
    }
}

impl FromStr for SolverSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy_shift" => Ok(SolverSelection::EasyShift),
            "heuristic" => Ok(SolverSelection::Heuristic),
            "lp" => Ok(SolverSelection::Lp),
            "all" => Ok(SolverSelection::All),
            other => Err(format!(
                "unknown solver \"{other}\", available: easy_shift, heuristic, lp, all"
            )),
        }
    }
}

/// Tie-break mode as written in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMode {
    #[default]
    HourIndex,
    /// Random per-run key drawn from `solver.seed`.
    Salted,
}

/// Solver selection and options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub kind: SolverSelection,
    /// Enforce `max_soc` during EasyShift search.
    pub storage_capacity: bool,
    /// Enable EasyShift cheaper-hour deferral.
    pub cheaper_hours: bool,
    pub tie_break: TieBreakMode,
    /// Seed for [`TieBreakMode::Salted`].
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverSelection::EasyShift,
            storage_capacity: true,
            cheaper_hours: true,
            tie_break: TieBreakMode::HourIndex,
            seed: 42,
        }
    }
}

impl SolverConfig {
    pub fn shift_options(&self) -> ShiftOptions {
        let tie_break = match self.tie_break {
            TieBreakMode::HourIndex => TieBreak::HourIndex,
            TieBreakMode::Salted => TieBreak::Salted { seed: self.seed },
        };
        ShiftOptions {
            storage_capacity: self.storage_capacity,
            cheaper_hours: self.cheaper_hours,
            tie_break,
        }
    }
}

/// Demand-response command generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalsConfig {
    /// `"output"` (classify solved output) or `"price"` (price percentiles).
    pub mode: SignalMode,
    /// Percentile at or above which an hour sheds (price mode).
    pub shed_above: f64,
    /// Percentile at or above which an hour runs normally (price mode).
    pub normal_above: f64,
    /// Percentile at or above which an hour loads up (price mode).
    pub load_up_above: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        let p = PercentileThresholds::default();
        Self {
            mode: SignalMode::Output,
            shed_above: p.shed_above,
            normal_above: p.normal_above,
            load_up_above: p.load_up_above,
        }
    }
}

impl SignalsConfig {
    pub fn percentiles(&self) -> PercentileThresholds {
        PercentileThresholds {
            shed_above: self.shed_above,
            normal_above: self.normal_above,
            load_up_above: self.load_up_above,
        }
    }
}

/// Output presentation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Clock hour of the first interval; labels only.
    pub start_hour: usize,
    /// Raise log verbosity to debug.
    pub verbose: bool,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"problem.price"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Time-of-use tariff for [`ScenarioConfig::tou_24h`]: off-peak overnight,
/// shoulder through the day, peak 16:00-21:00.
const TOU_PRICE: [f64; 24] = [
    0.08, 0.08, 0.08, 0.08, 0.08, 0.08, 0.08, 0.14, 0.14, 0.14, 0.14, 0.14, //
    0.12, 0.12, 0.14, 0.14, 0.32, 0.32, 0.32, 0.32, 0.32, 0.14, 0.08, 0.08,
];

/// Household hot-water draw with morning and evening peaks (kWh thermal).
const TOU_LOAD: [f64; 24] = [
    0.2, 0.2, 0.2, 0.2, 0.2, 0.3, 1.5, 2.5, 2.0, 0.8, 0.5, 0.4, //
    0.4, 0.4, 0.5, 0.6, 0.8, 1.2, 2.2, 2.5, 1.8, 0.9, 0.5, 0.3,
];

/// Heat-pump COP over the day; warmer afternoons lift it.
const TOU_COP: [f64; 24] = [
    2.6, 2.6, 2.5, 2.5, 2.5, 2.6, 2.7, 2.8, 2.9, 3.0, 3.1, 3.2, //
    3.3, 3.3, 3.3, 3.2, 3.1, 3.0, 2.9, 2.8, 2.7, 2.7, 2.6, 2.6,
];

impl ScenarioConfig {
    /// Four-hour demo: one 5 kWh draw at the end, cheapest pre-heat at hour 2.
    pub fn demo() -> Self {
        Self {
            problem: ProblemConfig {
                horizon: 4,
                price: vec![0.10, 0.30, 0.05, 0.20],
                load: vec![0.0, 0.0, 0.0, 5.0],
                efficiency: Hourly::Scalar(1.0),
                min_input: Hourly::Scalar(0.0),
                max_input: Hourly::Scalar(5.0),
                hardware: HardwareKind::HeatPump,
            },
            storage: StorageConfig {
                initial_soc: 0.0,
                min_soc: 0.0,
                max_soc: 5.0,
            },
            solver: SolverConfig::default(),
            signals: SignalsConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Full day on a time-of-use tariff with a 12 kWh tank.
    pub fn tou_24h() -> Self {
        Self {
            problem: ProblemConfig {
                horizon: 24,
                price: TOU_PRICE.to_vec(),
                load: TOU_LOAD.to_vec(),
                efficiency: Hourly::PerHour(TOU_COP.to_vec()),
                min_input: Hourly::Scalar(0.0),
                max_input: Hourly::Scalar(3.0),
                hardware: HardwareKind::HeatPump,
            },
            storage: StorageConfig {
                initial_soc: 4.0,
                min_soc: 1.0,
                max_soc: 12.0,
            },
            solver: SolverConfig {
                kind: SolverSelection::All,
                ..SolverConfig::default()
            },
            signals: SignalsConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// One hour whose load exceeds what the heater and an empty tank can supply.
    pub fn infeasible() -> Self {
        Self {
            problem: ProblemConfig {
                horizon: 1,
                price: vec![0.10],
                load: vec![10.0],
                efficiency: Hourly::Scalar(1.0),
                min_input: Hourly::Scalar(0.0),
                max_input: Hourly::Scalar(5.0),
                hardware: HardwareKind::HeatPump,
            },
            storage: StorageConfig {
                initial_soc: 0.0,
                min_soc: 0.0,
                max_soc: 0.0,
            },
            solver: SolverConfig {
                kind: SolverSelection::All,
                ..SolverConfig::default()
            },
            signals: SignalsConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "tou_24h", "infeasible"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "tou_24h" => Ok(Self::tou_24h()),
            "infeasible" => Ok(Self::infeasible()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let p = &self.problem;
        let n = p.horizon;

        if n == 0 {
            errors.push(ConfigError::new("problem.horizon", "must be > 0"));
        }
        for (field, values) in [("problem.price", &p.price), ("problem.load", &p.load)] {
            if values.len() != n {
                errors.push(ConfigError::new(
                    field,
                    format!("has {} values, expected {n} (horizon)", values.len()),
                ));
            }
            if values.iter().any(|v| !v.is_finite()) {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }

        let expanded: Vec<(&str, Option<Vec<f64>>)> = [
            ("problem.efficiency", &p.efficiency),
            ("problem.min_input", &p.min_input),
            ("problem.max_input", &p.max_input),
        ]
        .into_iter()
        .map(|(field, hourly)| match hourly.expand("", n) {
            Ok(values) => {
                if values.iter().any(|v| !v.is_finite()) {
                    errors.push(ConfigError::new(field, "must be finite"));
                }
                (field, Some(values))
            }
            Err(_) => {
                errors.push(ConfigError::new(
                    field,
                    format!("must be a number or a list of {n} values"),
                ));
                (field, None)
            }
        })
        .collect();

        if let (Some(min), Some(max)) = (&expanded[1].1, &expanded[2].1) {
            if let Some(hour) = min.iter().zip(max).position(|(lo, hi)| lo > hi) {
                errors.push(ConfigError::new(
                    "problem.min_input",
                    format!("must be <= problem.max_input (violated at hour {hour})"),
                ));
            }
        }

        let s = &self.storage;
        if [s.initial_soc, s.min_soc, s.max_soc].iter().any(|v| !v.is_finite()) {
            errors.push(ConfigError::new("storage", "values must be finite"));
        }
        if s.min_soc > s.max_soc {
            errors.push(ConfigError::new("storage.min_soc", "must be <= storage.max_soc"));
        }

        let sig = &self.signals;
        for (field, pct) in [
            ("signals.shed_above", sig.shed_above),
            ("signals.normal_above", sig.normal_above),
            ("signals.load_up_above", sig.load_up_above),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                errors.push(ConfigError::new(field, "must be in [0, 100]"));
            }
        }
        if !(sig.shed_above >= sig.normal_above && sig.normal_above >= sig.load_up_above) {
            errors.push(ConfigError::new(
                "signals",
                "percentiles must satisfy shed_above >= normal_above >= load_up_above",
            ));
        }

        errors
    }

    /// Builds validated solver parameters from the `[problem]` and `[storage]` tables.
    ///
    /// # Errors
    ///
    /// Returns a [`ParamsError`] if the parameters are inconsistent.
    pub fn to_params(&self) -> Result<ProblemParams, ParamsError> {
        let p = &self.problem;
        let s = &self.storage;
        ProblemParams::builder()
            .horizon(p.horizon)
            .price(p.price.clone())
            .load(p.load.clone())
            .efficiency(p.efficiency.clone())
            .min_input(p.min_input.clone())
            .max_input(p.max_input.clone())
            .initial_soc(s.initial_soc)
            .min_soc(s.min_soc)
            .max_soc(s.max_soc)
            .hardware(p.hardware)
            .build()
    }
}
