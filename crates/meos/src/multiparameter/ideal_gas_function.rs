use num_dual::DualNum;
use serde::{Deserialize, Serialize};

/// Single term of the ideal gas reduced Helmholtz energy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdealGasFunction {
    /// $\ln\delta+a_1+a_2\tau$
    Lead { a1: f64, a2: f64 },
    /// $a\ln\tau$
    LogTau { a: f64 },
    /// $n\tau^t$
    Power { n: f64, t: f64 },
    /// $n\ln\left(1-\exp(-\theta\tau)\right)$
    PlanckEinstein { n: f64, theta: f64 },
    /// $n\ln\left(c+d\exp(\theta\tau)\right)$
    PlanckEinsteinGeneralized { n: f64, theta: f64, c: f64, d: f64 },
    /// $n\ln\left|\sinh(\theta\tau)\right|$
    Sinh { n: f64, theta: f64 },
    /// $-n\ln\cosh(\theta\tau)$
    Cosh { n: f64, theta: f64 },
    /// Integral of $c_p^0/R=c$ from the reference temperature `t0`.
    /// `tc` is the reducing temperature of the equation.
    Cp0Constant { c: f64, t0: f64, tc: f64 },
    /// Integral of $c_p^0/R=cT^t$ from the reference temperature `t0`.
    Cp0Power { c: f64, t: f64, t0: f64, tc: f64 },
    /// $a_1+a_2\tau$, used to shift the reference state.
    EnthalpyEntropyOffset { a1: f64, a2: f64 },
}

impl IdealGasFunction {
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        match *self {
            Self::Lead { a1, a2 } => delta.ln() + a1 + tau * a2,
            Self::LogTau { a } => tau.ln() * a,
            Self::Power { n, t } => tau.powf(t) * n,
            Self::PlanckEinstein { n, theta } => (-(-tau * theta).exp()).ln_1p() * n,
            Self::PlanckEinsteinGeneralized { n, theta, c, d } => {
                ((tau * theta).exp() * d + c).ln() * n
            }
            Self::Sinh { n, theta } => (tau * theta).sinh().ln() * n,
            Self::Cosh { n, theta } => -(tau * theta).cosh().ln() * n,
            Self::Cp0Constant { c, t0, tc } => {
                let tau0 = tc / t0;
                (-tau / tau0 + 1.0 + (tau / tau0).ln()) * c
            }
            Self::Cp0Power { c, t, t0, tc } => {
                if t.abs() < 10.0 * f64::EPSILON {
                    let tau0 = tc / t0;
                    (-tau / tau0 + 1.0 + (tau / tau0).ln()) * c
                } else if (t + 1.0).abs() < 10.0 * f64::EPSILON {
                    let tau0 = tc / t0;
                    (-tau / tc * (tau / tau0).ln() + (tau - tau0) / tc) * c
                } else {
                    (-tau.powf(-t) * tc.powf(t) / (t * (t + 1.0))
                        - tau * t0.powf(t + 1.0) / (tc * (t + 1.0))
                        + t0.powf(t) / t)
                        * c
                }
            }
            Self::EnthalpyEntropyOffset { a1, a2 } => tau * a2 + a1,
        }
    }
}
