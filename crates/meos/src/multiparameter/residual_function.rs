use num_dual::DualNum;
use serde::{Deserialize, Serialize};

/// Shift applied to $\delta$ at $\delta=1$, where the distance function of
/// the non-analytic terms has a singular derivative.
const NON_ANALYTIC_SHIFT: f64 = 1e-12;

/// Single term of the residual reduced Helmholtz energy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResidualFunction {
    /// $n\delta^d\tau^t$, multiplied by $\exp(-\delta^l)$ if $l\neq0$
    Power {
        n: f64,
        d: f64,
        t: f64,
        #[serde(default)]
        l: i32,
    },
    /// $n\delta^d\tau^t\exp(-g\delta^l)$
    Exponential {
        n: f64,
        d: f64,
        t: f64,
        g: f64,
        l: i32,
    },
    /// $n\delta^d\tau^t\exp\left(-\eta(\delta-\varepsilon)^2-\beta(\tau-\gamma)^2\right)$
    Gaussian {
        n: f64,
        d: f64,
        t: f64,
        eta: f64,
        epsilon: f64,
        beta: f64,
        gamma: f64,
    },
    /// Near-critical terms of IAPWS-95 and Span & Wagner (1996).
    NonAnalytic {
        n: f64,
        a: f64,
        b: f64,
        beta: f64,
        #[serde(rename = "A")]
        aa: f64,
        #[serde(rename = "B")]
        bb: f64,
        #[serde(rename = "C")]
        cc: f64,
        #[serde(rename = "D")]
        dd: f64,
    },
    /// $n\delta^d\tau^t\exp\left(-g_d\delta^{l_d}-g_t\tau^{l_t}\right)$
    DoubleExponential {
        n: f64,
        d: f64,
        t: f64,
        gd: f64,
        ld: i32,
        gt: f64,
        lt: i32,
    },
    /// Terms of the ammonia equation of Gao et al. (2020).
    GaoB {
        n: f64,
        d: f64,
        t: f64,
        eta: f64,
        epsilon: f64,
        beta: f64,
        gamma: f64,
        b: f64,
    },
    /// Two-site association term $n(2\ln X-X+1)$ with the fraction of
    /// non-bonded sites $X$ and the association strength
    /// $\Delta=b\delta\left(\exp(\varepsilon\tau)-1\right)$.
    Associating { n: f64, b: f64, epsilon: f64 },
}

/// $x^e$ with exact derivatives for integer exponents.
///
/// Fractional powers of zero evaluate to zero.
pub(crate) fn pow<D: DualNum<f64> + Copy>(x: D, e: f64) -> D {
    if e.fract() == 0.0 && e.abs() < i32::MAX as f64 {
        x.powi(e as i32)
    } else if x.re() == 0.0 {
        D::zero()
    } else {
        x.powf(e)
    }
}

impl ResidualFunction {
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        match *self {
            Self::Power { n, d, t, l } => {
                let mut pre = pow(delta, d) * pow(tau, t) * n;
                if l != 0 {
                    pre *= (-delta.powi(l)).exp()
                };
                pre
            }
            Self::Exponential { n, d, t, g, l } => {
                pow(delta, d) * pow(tau, t) * n * (-delta.powi(l) * g).exp()
            }
            Self::Gaussian {
                n,
                d,
                t,
                eta,
                epsilon,
                beta,
                gamma,
            } => {
                (pow(delta, d) * pow(tau, t) * n)
                    * (-(delta - epsilon).powi(2) * eta - (tau - gamma).powi(2) * beta).exp()
            }
            Self::NonAnalytic {
                n,
                a,
                b,
                beta,
                aa,
                bb,
                cc,
                dd,
            } => {
                let delta = if delta.re() == 1.0 {
                    delta + NON_ANALYTIC_SHIFT
                } else {
                    delta
                };
                let delta_m1 = (delta - 1.0).powi(2);
                let psi = (-delta_m1 * cc - (tau - 1.0).powi(2) * dd).exp();
                let theta = -tau + 1.0 + delta_m1.powf(0.5 / beta) * aa;
                let distance = theta * theta + delta_m1.powf(a) * bb;
                distance.powf(b) * delta * psi * n
            }
            Self::DoubleExponential {
                n,
                d,
                t,
                gd,
                ld,
                gt,
                lt,
            } => {
                pow(delta, d)
                    * pow(tau, t)
                    * n
                    * (-delta.powi(ld) * gd - tau.powi(lt) * gt).exp()
            }
            Self::GaoB {
                n,
                d,
                t,
                eta,
                epsilon,
                beta,
                gamma,
                b,
            } => {
                let f_delta = pow(delta, d) * ((delta - epsilon).powi(2) * eta).exp();
                let f_tau = pow(tau, t) * ((tau - gamma).powi(2) * beta + b).recip().exp();
                f_tau * f_delta * n
            }
            Self::Associating { n, b, epsilon } => {
                let strength = delta * b * ((tau * epsilon).exp() - 1.0);
                // X = (sqrt(1 + 4 Delta) - 1) / (2 Delta), written without the division by Delta
                let x = ((strength * 4.0 + 1.0).sqrt() + 1.0).recip() * 2.0;
                (x.ln() * 2.0 - x + 1.0) * n
            }
        }
    }
}
