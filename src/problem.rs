//! Validated scheduling problem: horizon, tariff, load, COP, input and storage bounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a [`ProblemParams`].
///
/// Every variant is fatal: parameters are rejected before any solving starts
/// and are never silently coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    /// A required field was never supplied to the builder.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// The horizon must contain at least one hour.
    #[error("horizon must be > 0")]
    ZeroHorizon,
    /// A per-hour vector does not match the horizon.
    #[error("`{field}` has {actual} values, expected {expected} (horizon)")]
    LengthMismatch {
        /// Offending field name.
        field: &'static str,
        /// Horizon length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// NaN or infinite value.
    #[error("`{field}` is not finite at hour {hour}")]
    NonFinite {
        /// Offending field name.
        field: &'static str,
        /// First offending hour (0 for scalar fields).
        hour: usize,
    },
    /// `min_input[h] > max_input[h]`.
    #[error("min_input ({min}) exceeds max_input ({max}) at hour {hour}")]
    InputBoundsInverted {
        /// Offending hour.
        hour: usize,
        /// Lower bound at that hour.
        min: f64,
        /// Upper bound at that hour.
        max: f64,
    },
    /// `min_soc > max_soc`.
    #[error("min_soc ({min}) exceeds max_soc ({max})")]
    StorageBoundsInverted {
        /// Reserve floor.
        min: f64,
        /// Capacity ceiling.
        max: f64,
    },
}

/// A per-hour quantity given either as one value for every hour or as an explicit vector.
///
/// Deserializes from a TOML/JSON number or array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hourly {
    /// Broadcast to every hour of the horizon.
    Scalar(f64),
    /// One value per hour; length must equal the horizon.
    PerHour(Vec<f64>),
}

impl Hourly {
    /// Expands into exactly `horizon` values.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::LengthMismatch`] if a vector has the wrong length.
    pub fn expand(&self, field: &'static str, horizon: usize) -> Result<Vec<f64>, ParamsError> {
        match self {
            Self::Scalar(v) => Ok(vec![*v; horizon]),
            Self::PerHour(values) if values.len() == horizon => Ok(values.clone()),
            Self::PerHour(values) => Err(ParamsError::LengthMismatch {
                field,
                expected: horizon,
                actual: values.len(),
            }),
        }
    }
}

impl From<f64> for Hourly {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for Hourly {
    fn from(values: Vec<f64>) -> Self {
        Self::PerHour(values)
    }
}

impl From<&[f64]> for Hourly {
    fn from(values: &[f64]) -> Self {
        Self::PerHour(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Hourly {
    fn from(values: [f64; N]) -> Self {
        Self::PerHour(values.to_vec())
    }
}

/// How thermal output converts into billed electrical energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareKind {
    /// Electrical energy = thermal output / COP.
    #[default]
    HeatPump,
    /// Electrical energy = thermal output (COP ignored).
    Resistance,
}

/// Immutable, validated parameter set for one solve call.
///
/// All per-hour vectors have exactly `horizon` entries. Solvers only ever
/// borrow this; their working vectors live elsewhere.
///
/// # Examples
///
/// ```
/// use hpwh_shift::problem::ProblemParams;
///
/// let params = ProblemParams::builder()
///     .horizon(2)
///     .price([0.1, 0.2])
///     .load([0.0, 3.0])
///     .efficiency(3.0)
///     .min_input(0.0)
///     .max_input(4.0)
///     .max_soc(5.0)
///     .build()
///     .expect("valid parameters");
/// assert_eq!(params.max_input(), &[4.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemParams {
    horizon: usize,
    price: Vec<f64>,
    load: Vec<f64>,
    efficiency: Vec<f64>,
    min_input: Vec<f64>,
    max_input: Vec<f64>,
    initial_soc: f64,
    min_soc: f64,
    max_soc: f64,
    hardware: HardwareKind,
}

impl ProblemParams {
    /// Starts an empty builder.
    pub fn builder() -> ProblemParamsBuilder {
        ProblemParamsBuilder::default()
    }

    /// Number of hourly intervals, N.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Electricity price per hour ($/kWh).
    pub fn price(&self) -> &[f64] {
        &self.price
    }

    /// Thermal load per hour (kWh).
    pub fn load(&self) -> &[f64] {
        &self.load
    }

    /// COP per hour.
    pub fn efficiency(&self) -> &[f64] {
        &self.efficiency
    }

    /// Lower output bound per hour (kWh).
    pub fn min_input(&self) -> &[f64] {
        &self.min_input
    }

    /// Upper output bound per hour (kWh).
    pub fn max_input(&self) -> &[f64] {
        &self.max_input
    }

    /// Tank charge at the start of hour 0 (kWh).
    pub fn initial_soc(&self) -> f64 {
        self.initial_soc
    }

    /// Reserve floor (kWh).
    pub fn min_soc(&self) -> f64 {
        self.min_soc
    }

    /// Capacity ceiling (kWh).
    pub fn max_soc(&self) -> f64 {
        self.max_soc
    }

    /// Conversion used for cost accounting.
    pub fn hardware(&self) -> HardwareKind {
        self.hardware
    }

    /// Electrical cost of one kWh of thermal output at `hour`.
    ///
    /// Division by COP is skipped when the COP is not positive or the
    /// hardware is a resistance element.
    pub fn cost_per_thermal_kwh(&self, hour: usize) -> f64 {
        let price = self.price[hour];
        let cop = self.efficiency[hour];
        match self.hardware {
            HardwareKind::HeatPump if cop > 0.0 => price / cop,
            _ => price,
        }
    }

    /// Electrical energy drawn to deliver `thermal_kwh` at `hour`.
    pub fn electrical_kwh(&self, hour: usize, thermal_kwh: f64) -> f64 {
        let cop = self.efficiency[hour];
        match self.hardware {
            HardwareKind::HeatPump if cop > 0.0 => thermal_kwh / cop,
            _ => thermal_kwh,
        }
    }
}

/// Builder for [`ProblemParams`].
///
/// `horizon`, `price`, `load`, `max_input` and `max_soc` are required;
/// `efficiency` defaults to 1.0, `min_input`, `initial_soc` and `min_soc` to 0.0.
#[derive(Debug, Clone, Default)]
pub struct ProblemParamsBuilder {
    horizon: Option<usize>,
    price: Option<Vec<f64>>,
    load: Option<Vec<f64>>,
    efficiency: Option<Hourly>,
    min_input: Option<Hourly>,
    max_input: Option<Hourly>,
    initial_soc: Option<f64>,
    min_soc: Option<f64>,
    max_soc: Option<f64>,
    hardware: HardwareKind,
}

impl ProblemParamsBuilder {
    pub fn horizon(mut self, horizon: usize) -> Self {
        self.horizon = Some(horizon);
        self
    }

    pub fn price(mut self, price: impl Into<Vec<f64>>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn load(mut self, load: impl Into<Vec<f64>>) -> Self {
        self.load = Some(load.into());
        self
    }

    pub fn efficiency(mut self, efficiency: impl Into<Hourly>) -> Self {
        self.efficiency = Some(efficiency.into());
        self
    }

    pub fn min_input(mut self, min_input: impl Into<Hourly>) -> Self {
        self.min_input = Some(min_input.into());
        self
    }

    pub fn max_input(mut self, max_input: impl Into<Hourly>) -> Self {
        self.max_input = Some(max_input.into());
        self
    }

    pub fn initial_soc(mut self, initial_soc: f64) -> Self {
        self.initial_soc = Some(initial_soc);
        self
    }

    pub fn min_soc(mut self, min_soc: f64) -> Self {
        self.min_soc = Some(min_soc);
        self
    }

    pub fn max_soc(mut self, max_soc: f64) -> Self {
        self.max_soc = Some(max_soc);
        self
    }

    pub fn hardware(mut self, hardware: HardwareKind) -> Self {
        self.hardware = hardware;
        self
    }

    /// Validates and normalizes the collected fields.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParamsError`] found.
    pub fn build(self) -> Result<ProblemParams, ParamsError> {
        let horizon = self.horizon.ok_or(ParamsError::MissingField("horizon"))?;
        if horizon == 0 {
            return Err(ParamsError::ZeroHorizon);
        }

        let price = self.price.ok_or(ParamsError::MissingField("price"))?;
        let load = self.load.ok_or(ParamsError::MissingField("load"))?;
        check_len("price", &price, horizon)?;
        check_len("load", &load, horizon)?;

        let efficiency = self
            .efficiency
            .unwrap_or(Hourly::Scalar(1.0))
            .expand("efficiency", horizon)?;
        let min_input = self
            .min_input
            .unwrap_or(Hourly::Scalar(0.0))
            .expand("min_input", horizon)?;
        let max_input = self
            .max_input
            .ok_or(ParamsError::MissingField("max_input"))?
            .expand("max_input", horizon)?;
        let max_soc = self.max_soc.ok_or(ParamsError::MissingField("max_soc"))?;
        let min_soc = self.min_soc.unwrap_or(0.0);
        let initial_soc = self.initial_soc.unwrap_or(0.0);

        for (field, values) in [
            ("price", &price),
            ("load", &load),
            ("efficiency", &efficiency),
            ("min_input", &min_input),
            ("max_input", &max_input),
        ] {
            check_finite(field, values)?;
        }
        for (field, value) in [
            ("initial_soc", initial_soc),
            ("min_soc", min_soc),
            ("max_soc", max_soc),
        ] {
            if !value.is_finite() {
                return Err(ParamsError::NonFinite { field, hour: 0 });
            }
        }

        if let Some(hour) = (0..horizon).find(|&h| min_input[h] > max_input[h]) {
            return Err(ParamsError::InputBoundsInverted {
                hour,
                min: min_input[hour],
                max: max_input[hour],
            });
        }
        if min_soc > max_soc {
            return Err(ParamsError::StorageBoundsInverted {
                min: min_soc,
                max: max_soc,
            });
        }

        Ok(ProblemParams {
            horizon,
            price,
            load,
            efficiency,
            min_input,
            max_input,
            initial_soc,
            min_soc,
            max_soc,
            hardware: self.hardware,
        })
    }
}

fn check_len(field: &'static str, values: &[f64], horizon: usize) -> Result<(), ParamsError> {
    if values.len() == horizon {
        Ok(())
    } else {
        Err(ParamsError::LengthMismatch {
            field,
            expected: horizon,
            actual: values.len(),
        })
    }
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), ParamsError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(hour) => Err(ParamsError::NonFinite { field, hour }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ProblemParamsBuilder {
        ProblemParams::builder()
            .horizon(3)
            .price([0.1, 0.2, 0.3])
            .load([1.0, 1.0, 1.0])
            .max_input(2.0)
            .max_soc(4.0)
    }

    #[test]
    fn scalars_broadcast_to_horizon() {
        let p = base().min_input(0.5).efficiency(3.0).build();
        let p = p.as_ref().ok();
        assert_eq!(p.map(|p| p.min_input().to_vec()), Some(vec![0.5; 3]));
        assert_eq!(p.map(|p| p.max_input().to_vec()), Some(vec![2.0; 3]));
        assert_eq!(p.map(|p| p.efficiency().to_vec()), Some(vec![3.0; 3]));
    }

    #[test]
    fn optional_fields_default() {
        let p = base().build().ok();
        assert_eq!(p.as_ref().map(ProblemParams::initial_soc), Some(0.0));
        assert_eq!(p.as_ref().map(ProblemParams::min_soc), Some(0.0));
        assert_eq!(p.as_ref().map(ProblemParams::hardware), Some(HardwareKind::HeatPump));
    }

    #[test]
    fn missing_required_field_fails() {
        let err = ProblemParams::builder()
            .horizon(1)
            .price([0.1])
            .load([1.0])
            .max_soc(1.0)
            .build();
        assert_eq!(err, Err(ParamsError::MissingField("max_input")));
    }

    #[test]
    fn zero_horizon_fails() {
        let err = base().horizon(0).build();
        assert_eq!(err, Err(ParamsError::ZeroHorizon));
    }

    #[test]
    fn length_mismatch_fails() {
        let err = base().load([1.0, 1.0]).build();
        assert_eq!(
            err,
            Err(ParamsError::LengthMismatch {
                field: "load",
                expected: 3,
                actual: 2
            })
        );
        let err = base().max_input([1.0, 2.0, 3.0, 4.0]).build();
        assert!(matches!(
            err,
            Err(ParamsError::LengthMismatch {
                field: "max_input",
                ..
            })
        ));
    }

    #[test]
    fn inverted_storage_bounds_fail() {
        let err = base().min_soc(5.0).build();
        assert_eq!(
            err,
            Err(ParamsError::StorageBoundsInverted { min: 5.0, max: 4.0 })
        );
    }

    #[test]
    fn inverted_input_bounds_fail() {
        let err = base().min_input([0.0, 3.0, 0.0]).build();
        assert!(matches!(
            err,
            Err(ParamsError::InputBoundsInverted { hour: 1, .. })
        ));
    }

    #[test]
    fn nan_is_rejected() {
        let err = base().price([0.1, f64::NAN, 0.3]).build();
        assert_eq!(
            err,
            Err(ParamsError::NonFinite {
                field: "price",
                hour: 1
            })
        );
    }

    #[test]
    fn cost_per_kwh_skips_non_positive_cop() {
        let p = base().efficiency([2.0, 0.0, -1.0]).build().ok();
        let costs: Option<Vec<f64>> = p.map(|p| (0..3).map(|h| p.cost_per_thermal_kwh(h)).collect());
        assert_eq!(costs, Some(vec![0.05, 0.2, 0.3]));
    }

    #[test]
    fn resistance_hardware_ignores_cop() {
        let p = base()
            .efficiency(4.0)
            .hardware(HardwareKind::Resistance)
            .build()
            .ok();
        assert_eq!(p.map(|p| p.cost_per_thermal_kwh(0)), Some(0.1));
    }

    #[test]
    fn hourly_deserializes_scalar_or_list() {
        #[derive(Deserialize)]
        struct Wrap {
            v: Hourly,
        }
        let s: Option<Wrap> = toml::from_str("v = 2.5").ok();
        assert_eq!(s.map(|w| w.v), Some(Hourly::Scalar(2.5)));
        let l: Option<Wrap> = toml::from_str("v = [1.0, 2.0]").ok();
        assert_eq!(l.map(|w| w.v), Some(Hourly::PerHour(vec![1.0, 2.0])));
    }
}
