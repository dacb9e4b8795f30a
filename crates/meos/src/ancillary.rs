//! Ancillary equations for the saturation properties of pure fluids.
//!
//! Ancillary equations are fast, explicit fits of the vapor pressure and
//! the saturated densities. They are only used as initial values for the
//! solvers and are never returned as converged results.
use meos_core::solver::newton;
use meos_core::{CriticalConstants, MeosError, MeosResult, SaturationEstimate};
use num_dual::{Dual64, DualNum};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance for the consistency of reducing constants.
const CONSISTENCY_TOL: f64 = 1e-10;
/// Lower bound of the range of validity in units of the reducing temperature.
const MIN_REDUCED_TEMPERATURE: f64 = 1e-3;

/// Parametric forms of an ancillary equation with $\theta=1-T/T_\mathrm{red}$.
///
/// Stored as the integer `eq` in parameter files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AncillaryForm {
    /// `eq = 1`: $X=X_\mathrm{red}\left(1+\sum_in_i\theta^{t_i}\right)$
    Power,
    /// `eq = 2`: $X=X_\mathrm{red}\left(1+\sum_in_i\theta^{t_i/3}\right)$
    PowerThird,
    /// `eq = 3`: $X=X_\mathrm{red}\exp\left(\sum_in_i\theta^{t_i}\right)$
    Exponential,
    /// `eq = 4`: $X=X_\mathrm{red}\exp\left(\sum_in_i\theta^{t_i/3}\right)$
    ExponentialThird,
    /// `eq = 5`: $X=X_\mathrm{red}\exp\left(\frac{T_\mathrm{red}}{T}\sum_in_i\theta^{t_i}\right)$
    ReducedExponential,
    /// `eq = 6`: $X=X_\mathrm{red}\exp\left(\frac{T_\mathrm{red}}{T}\sum_in_i\theta^{t_i/3}\right)$
    ReducedExponentialThird,
}

impl TryFrom<u8> for AncillaryForm {
    type Error = String;

    fn try_from(eq: u8) -> Result<Self, Self::Error> {
        match eq {
            1 => Ok(Self::Power),
            2 => Ok(Self::PowerThird),
            3 => Ok(Self::Exponential),
            4 => Ok(Self::ExponentialThird),
            5 => Ok(Self::ReducedExponential),
            6 => Ok(Self::ReducedExponentialThird),
            _ => Err(format!("unknown ancillary equation eq = {eq}")),
        }
    }
}

impl From<AncillaryForm> for u8 {
    fn from(form: AncillaryForm) -> Self {
        match form {
            AncillaryForm::Power => 1,
            AncillaryForm::PowerThird => 2,
            AncillaryForm::Exponential => 3,
            AncillaryForm::ExponentialThird => 4,
            AncillaryForm::ReducedExponential => 5,
            AncillaryForm::ReducedExponentialThird => 6,
        }
    }
}

impl AncillaryForm {
    fn exponent_scale(self) -> f64 {
        match self {
            Self::PowerThird | Self::ExponentialThird | Self::ReducedExponentialThird => 1.0 / 3.0,
            _ => 1.0,
        }
    }
}

/// A single ancillary equation.
///
/// The reducing values default to the critical constants of the equation
/// of state. If they are given explicitly, they have to be equal to them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AncillaryCorrelation {
    #[serde(rename = "eq")]
    pub form: AncillaryForm,
    pub n: Vec<f64>,
    pub t: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_red: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_red: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl fmt::Display for AncillaryCorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AncillaryCorrelation(eq={}, terms={})",
            u8::from(self.form),
            self.n.len()
        )
    }
}

fn check_reducing_value(name: &str, given: Option<f64>, expected: f64) -> MeosResult<f64> {
    match given {
        Some(x) if ((x - expected) / expected).abs() > CONSISTENCY_TOL => {
            Err(MeosError::Configuration(format!(
                "ancillary {name} = {x} is inconsistent with the equation of state ({expected})"
            )))
        }
        _ => Ok(expected),
    }
}

impl AncillaryCorrelation {
    /// Check the coefficients and fill in the reducing values.
    pub fn validate(&self, t_red: f64, x_red: f64) -> MeosResult<Self> {
        if self.n.is_empty() || self.n.len() != self.t.len() {
            return Err(MeosError::Configuration(format!(
                "ancillary equation with {} coefficients and {} exponents",
                self.n.len(),
                self.t.len()
            )));
        }
        Ok(Self {
            t_red: Some(check_reducing_value("reducing temperature", self.t_red, t_red)?),
            x_red: Some(check_reducing_value("reducing value", self.x_red, x_red)?),
            ..self.clone()
        })
    }

    fn reducing_values(&self) -> (f64, f64) {
        (
            self.t_red.unwrap_or(f64::NAN),
            self.x_red.unwrap_or(f64::NAN),
        )
    }

    /// Whether the temperature lies inside $[10^{-3}T_\mathrm{red}, T_\mathrm{red})$.
    pub fn is_valid(&self, temperature: f64) -> bool {
        let (t_red, _) = self.reducing_values();
        temperature >= MIN_REDUCED_TEMPERATURE * t_red && temperature < t_red
    }

    /// Evaluate the ancillary equation.
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, temperature: D) -> D {
        let (t_red, x_red) = self.reducing_values();
        let theta = -temperature / t_red + 1.0;
        let scale = self.form.exponent_scale();
        let sum = self
            .n
            .iter()
            .zip(&self.t)
            .fold(D::zero(), |acc, (&n, &t)| acc + theta.powf(t * scale) * n);
        match self.form {
            AncillaryForm::Power | AncillaryForm::PowerThird => (sum + 1.0) * x_red,
            AncillaryForm::Exponential | AncillaryForm::ExponentialThird => sum.exp() * x_red,
            AncillaryForm::ReducedExponential | AncillaryForm::ReducedExponentialThird => {
                (sum * t_red / temperature).exp() * x_red
            }
        }
    }
}

/// The ancillary equations of a fluid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ancillaries {
    pub vapor_pressure: AncillaryCorrelation,
    pub liquid_density: AncillaryCorrelation,
    pub vapor_density: AncillaryCorrelation,
}

impl Ancillaries {
    /// Check all ancillary equations against the critical point of the
    /// equation of state.
    pub fn validate(&self, critical_constants: CriticalConstants) -> MeosResult<Self> {
        let CriticalConstants {
            temperature,
            density,
            pressure,
        } = critical_constants;
        Ok(Self {
            vapor_pressure: self.vapor_pressure.validate(temperature, pressure)?,
            liquid_density: self.liquid_density.validate(temperature, density)?,
            vapor_density: self.vapor_density.validate(temperature, density)?,
        })
    }

    /// Vapor pressure and saturated densities in SI units.
    ///
    /// Returns `None` outside of the range of validity.
    pub fn estimate(&self, temperature: f64) -> Option<SaturationEstimate> {
        if !self.vapor_pressure.is_valid(temperature) {
            return None;
        }
        let estimate = SaturationEstimate {
            pressure: self.vapor_pressure.evaluate(temperature),
            liquid_density: self.liquid_density.evaluate(temperature),
            vapor_density: self.vapor_density.evaluate(temperature),
        };
        let valid = [
            estimate.pressure,
            estimate.liquid_density,
            estimate.vapor_density,
        ]
        .iter()
        .all(|x| x.is_finite() && *x > 0.0);
        (valid && estimate.liquid_density > estimate.vapor_density).then_some(estimate)
    }

    /// Saturation temperature at the given pressure from the inverted
    /// vapor pressure equation.
    pub fn temperature(&self, pressure: f64) -> Option<f64> {
        let (t_red, p_red) = self.vapor_pressure.reducing_values();
        if !(pressure > 0.0 && pressure < p_red) {
            return None;
        }
        // ln p is almost linear in 1/T
        let ln_p = pressure.ln();
        let (tau, _) = newton(
            "ancillary vapor pressure",
            1.5,
            |tau| {
                let t = Dual64::from_re(tau).derivative().recip() * t_red;
                let ln_p_sat = self.vapor_pressure.evaluate(t).ln();
                Ok((ln_p_sat.re - ln_p, ln_p_sat.eps, ()))
            },
            1e-12,
            [1.0 + 1e-10, 1.0 / MIN_REDUCED_TEMPERATURE],
        )
        .ok()?;
        let temperature = t_red / tau;
        self.vapor_pressure
            .is_valid(temperature)
            .then_some(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn critical_constants() -> CriticalConstants {
        CriticalConstants {
            temperature: 305.322,
            density: 6856.886685,
            pressure: 4872200.0,
        }
    }

    fn ethane() -> Ancillaries {
        let json = r#"{
            "vapor_pressure": {
                "eq": 5,
                "n": [-6.556209030760726, 1.5935383447029141, -1.287032670231627, -1.8575204210747853],
                "t": [1.0, 1.5, 2.5, 5.0]
            },
            "liquid_density": {
                "eq": 1,
                "n": [1.6079243914329397, 0.5440987305169559, 0.2991043972747703, 0.0013134336988701782, 0.23918944528373162],
                "t": [0.35, 0.5, 1.0, 2.0, 3.5]
            },
            "vapor_density": {
                "eq": 3,
                "n": [-2.2384905133364223, -3.7260635513677927, -7.4631049918496775, -12.345678026688, -55.5359442117906],
                "t": [0.35, 1.0, 2.0, 4.0, 7.5]
            }
        }"#;
        let ancillaries: Ancillaries = serde_json::from_str(json).unwrap();
        ancillaries.validate(critical_constants()).unwrap()
    }

    #[test]
    fn parametric_forms() -> MeosResult<()> {
        let (t_red, x_red) = (300.0, 2.0);
        let t = 240.0;
        let theta: f64 = 1.0 - t / t_red;
        let sum = |scale: f64| 0.5 * theta.powf(0.6 * scale) - 0.2 * theta.powf(1.5 * scale);
        let expected = [
            x_red * (1.0 + sum(1.0)),
            x_red * (1.0 + sum(1.0 / 3.0)),
            x_red * sum(1.0).exp(),
            x_red * sum(1.0 / 3.0).exp(),
            x_red * (t_red / t * sum(1.0)).exp(),
            x_red * (t_red / t * sum(1.0 / 3.0)).exp(),
        ];
        for (eq, x) in (1..=6).zip(expected) {
            let correlation = AncillaryCorrelation {
                form: AncillaryForm::try_from(eq).map_err(MeosError::Configuration)?,
                n: vec![0.5, -0.2],
                t: vec![0.6, 1.5],
                t_red: None,
                x_red: None,
                reference: None,
            }
            .validate(t_red, x_red)?;
            assert_relative_eq!(correlation.evaluate(t), x, max_relative = 1e-14);
        }
        Ok(())
    }

    #[test]
    fn unknown_form_and_inconsistent_constants() {
        let json = r#"{"eq": 7, "n": [1.0], "t": [1.0]}"#;
        assert!(serde_json::from_str::<AncillaryCorrelation>(json).is_err());
        let json = r#"{"eq": 1, "n": [1.0], "t": [1.0], "t_red": 305.0}"#;
        let correlation: AncillaryCorrelation = serde_json::from_str(json).unwrap();
        assert!(matches!(
            correlation.validate(305.322, 6856.886685),
            Err(MeosError::Configuration(_))
        ));
        let json = r#"{"eq": 1, "n": [1.0, 2.0], "t": [1.0]}"#;
        let correlation: AncillaryCorrelation = serde_json::from_str(json).unwrap();
        assert!(correlation.validate(305.322, 6856.886685).is_err());
    }

    #[test]
    fn range_of_validity() {
        let ancillaries = ethane();
        assert!(ancillaries.estimate(305.322).is_none());
        assert!(ancillaries.estimate(0.2).is_none());
        let estimate = ancillaries.estimate(200.0).unwrap();
        assert!(estimate.liquid_density > estimate.vapor_density);
        // approaches the critical point
        let estimate = ancillaries.estimate(305.0).unwrap();
        assert_relative_eq!(estimate.pressure, 4872200.0, max_relative = 0.02);
    }

    #[test]
    fn inverse_vapor_pressure() {
        let ancillaries = ethane();
        for t in [95.0, 150.0, 200.0, 250.0, 300.0] {
            let p = ancillaries.vapor_pressure.evaluate(t);
            let t_sat = ancillaries.temperature(p).unwrap();
            assert_relative_eq!(t_sat, t, max_relative = 1e-9);
        }
        assert!(ancillaries.temperature(5e6).is_none());
        assert!(ancillaries.temperature(-1.0).is_none());
    }
}
