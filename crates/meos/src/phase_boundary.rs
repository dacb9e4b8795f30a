//! Melting and sublimation pressure curves.
use meos_core::{MeosError, MeosResult};
use serde::{Deserialize, Serialize};

/// Coefficients of a phase boundary curve.
///
/// The range of validity defaults to temperatures above `t_ref` for
/// melting curves and below `t_ref` for sublimation curves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTerms {
    pub t_ref: f64,
    pub p_ref: f64,
    pub a: Vec<f64>,
    pub t: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub b: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub u: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl BoundaryTerms {
    fn sum(&self, theta: f64) -> f64 {
        let a: f64 = self.a.iter().zip(&self.t).map(|(a, t)| a * theta.powf(*t)).sum();
        let b: f64 = self
            .b
            .iter()
            .zip(&self.u)
            .map(|(b, u)| b * (theta - 1.0).powf(*u))
            .sum();
        a + b
    }
}

/// Pressure of a solid-fluid phase boundary as a function of temperature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseBoundaryCurve {
    /// $\frac{P}{P_\mathrm{ref}}=\sum_ia_i\theta^{t_i}+\sum_ib_i(\theta-1)^{u_i}$
    Polynomial(BoundaryTerms),
    /// $\ln\frac{P}{P_\mathrm{ref}}=\sum_ia_i\theta^{t_i}+\sum_ib_i(\theta-1)^{u_i}$
    Logarithmic(BoundaryTerms),
    /// $\ln\frac{P}{P_\mathrm{ref}}=\frac{1}{\theta}\sum_ia_i(1-\theta)^{t_i}$
    Sublimation(BoundaryTerms),
}

impl PhaseBoundaryCurve {
    pub fn terms(&self) -> &BoundaryTerms {
        match self {
            Self::Polynomial(terms) | Self::Logarithmic(terms) | Self::Sublimation(terms) => terms,
        }
    }

    pub fn validate(&self) -> MeosResult<()> {
        let terms = self.terms();
        if terms.a.is_empty() || terms.a.len() != terms.t.len() || terms.b.len() != terms.u.len()
        {
            return Err(MeosError::Configuration(format!(
                "phase boundary curve with {}/{} and {}/{} coefficients",
                terms.a.len(),
                terms.t.len(),
                terms.b.len(),
                terms.u.len()
            )));
        }
        if let Self::Sublimation(terms) = self {
            if !terms.b.is_empty() {
                return Err(MeosError::Configuration(
                    "sublimation curves do not accept `b` coefficients".into(),
                ));
            }
        }
        Ok(())
    }

    /// Range of validity in K.
    pub fn temperature_range(&self) -> (f64, f64) {
        match self {
            Self::Polynomial(terms) | Self::Logarithmic(terms) => (
                terms.t_min.unwrap_or(terms.t_ref),
                terms.t_max.unwrap_or(f64::INFINITY),
            ),
            Self::Sublimation(terms) => {
                (terms.t_min.unwrap_or(0.0), terms.t_max.unwrap_or(terms.t_ref))
            }
        }
    }

    /// Pressure on the curve in Pa.
    pub fn pressure(&self, temperature: f64) -> MeosResult<f64> {
        let (t_min, t_max) = self.temperature_range();
        if !(temperature > 0.0 && temperature >= t_min && temperature <= t_max) {
            return Err(MeosError::out_of_range(
                "temperature",
                temperature,
                t_min,
                t_max,
            ));
        }
        let terms = self.terms();
        let theta = temperature / terms.t_ref;
        let p = match self {
            Self::Polynomial(terms) => terms.p_ref * terms.sum(theta),
            Self::Logarithmic(terms) => terms.p_ref * terms.sum(theta).exp(),
            Self::Sublimation(terms) => {
                let sum: f64 = terms
                    .a
                    .iter()
                    .zip(&terms.t)
                    .map(|(a, t)| a * (1.0 - theta).powf(*t))
                    .sum();
                terms.p_ref * (sum / theta).exp()
            }
        };
        Ok(p)
    }
}
