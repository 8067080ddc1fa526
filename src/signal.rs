//! CTA-2045 water-heater command schedules derived from a solved schedule or
//! straight from a price curve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::problem::ProblemParams;
use crate::schedule::Schedule;

/// Output/capacity ratio at which a running hour becomes Load Up.
pub const LOAD_UP_FRACTION: f64 = 0.3;
/// Output/capacity ratio at which a running hour becomes Advanced Load Up.
pub const ADVANCED_LOAD_UP_FRACTION: f64 = 0.8;

/// Ordinal demand-response command for a water heater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cta2045Command {
    /// Coast on stored energy.
    Shed,
    /// Default operation.
    Normal,
    /// Heat ahead of a future shed.
    LoadUp,
    /// Heat aggressively.
    AdvancedLoadUp,
}

impl Cta2045Command {
    /// Wire code: -1, 0, 1 or 2.
    pub fn code(self) -> i8 {
        match self {
            Cta2045Command::Shed => -1,
            Cta2045Command::Normal => 0,
            Cta2045Command::LoadUp => 1,
            Cta2045Command::AdvancedLoadUp => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cta2045Command::Shed => "Shed",
            Cta2045Command::Normal => "Normal",
            Cta2045Command::LoadUp => "Load Up",
            Cta2045Command::AdvancedLoadUp => "Advanced Load Up",
        }
    }
}

impl fmt::Display for Cta2045Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which classifier produces the command schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    /// Ratio of scheduled output to capacity.
    #[default]
    Output,
    /// Price percentiles; no solve needed.
    Price,
}

impl FromStr for SignalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "output" => Ok(SignalMode::Output),
            "price" => Ok(SignalMode::Price),
            other => Err(format!("unknown signal mode '{other}'. Available: output, price")),
        }
    }
}

/// Classifies one hour by its output relative to capacity.
///
/// Zero capacity is always Normal; zero output with capacity is Shed.
pub fn classify_output(output: f64, capacity: f64) -> Cta2045Command {
    if capacity == 0.0 {
        return Cta2045Command::Normal;
    }
    if output == 0.0 {
        return Cta2045Command::Shed;
    }
    let fraction = output / capacity;
    if fraction < LOAD_UP_FRACTION {
        Cta2045Command::Normal
    } else if fraction < ADVANCED_LOAD_UP_FRACTION {
        Cta2045Command::LoadUp
    } else {
        Cta2045Command::AdvancedLoadUp
    }
}

/// Percentile cut points (0–100) for the price classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PercentileThresholds {
    /// Prices at or above this percentile shed.
    pub shed_above: f64,
    /// Prices at or above this percentile run normally.
    pub normal_above: f64,
    /// Prices at or above this percentile load up; below it, advanced load up.
    pub load_up_above: f64,
}

impl Default for PercentileThresholds {
    fn default() -> Self {
        Self {
            shed_above: 75.0,
            normal_above: 50.0,
            load_up_above: 25.0,
        }
    }
}

/// Absolute prices ($/kWh) resolved from [`PercentileThresholds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceThresholds {
    pub shed_above: f64,
    pub normal_above: f64,
    pub load_up_above: f64,
}

impl PriceThresholds {
    /// Resolves percentile cut points against `prices`.
    ///
    /// Returns `None` for an empty price curve.
    pub fn resolve(prices: &[f64], percentiles: &PercentileThresholds) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }
        let mut sorted = prices.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            shed_above: percentile(&sorted, percentiles.shed_above),
            normal_above: percentile(&sorted, percentiles.normal_above),
            load_up_above: percentile(&sorted, percentiles.load_up_above),
        })
    }

    pub fn classify(&self, price: f64) -> Cta2045Command {
        if price >= self.shed_above {
            Cta2045Command::Shed
        } else if price >= self.normal_above {
            Cta2045Command::Normal
        } else if price >= self.load_up_above {
            Cta2045Command::LoadUp
        } else {
            Cta2045Command::AdvancedLoadUp
        }
    }
}

/// Linear-interpolation percentile of an ascending, non-empty slice.
///
/// `pct` is clamped to `[0, 100]`.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Per-hour command sequence plus the context it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSchedule {
    pub mode: SignalMode,
    pub commands: Vec<Cta2045Command>,
    /// Resolved cut points; present only for [`SignalMode::Price`].
    pub price_thresholds: Option<PriceThresholds>,
}

impl SignalSchedule {
    /// Classifies each hour's output against `max_input`.
    pub fn from_schedule(schedule: &Schedule, params: &ProblemParams) -> Self {
        let commands = schedule
            .output
            .iter()
            .zip(params.max_input())
            .map(|(&out, &cap)| classify_output(out, cap))
            .collect();
        Self {
            mode: SignalMode::Output,
            commands,
            price_thresholds: None,
        }
    }

    /// Classifies each hour by price alone.
    pub fn from_prices(prices: &[f64], percentiles: &PercentileThresholds) -> Self {
        let price_thresholds = PriceThresholds::resolve(prices, percentiles);
        let commands = match &price_thresholds {
            Some(thresholds) => prices.iter().map(|&p| thresholds.classify(p)).collect(),
            None => Vec::new(),
        };
        Self {
            mode: SignalMode::Price,
            commands,
            price_thresholds,
        }
    }

    /// Wire codes, one per hour.
    pub fn codes(&self) -> Vec<i8> {
        self.commands.iter().map(|c| c.code()).collect()
    }
}
