use num_dual::{HyperDual64, HyperHyperDual64};
use std::ops::Add;

/// Reduced variables $\delta=\rho/\rho_\mathrm{red}$ and $\tau=T_\mathrm{red}/T$.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReducedVariables {
    pub delta: f64,
    pub tau: f64,
}

impl ReducedVariables {
    /// Reduce a temperature and a molar density with the reducing point of an equation.
    pub fn new(
        temperature: f64,
        density: f64,
        reducing_temperature: f64,
        reducing_density: f64,
    ) -> Self {
        Self {
            delta: density / reducing_density,
            tau: reducing_temperature / temperature,
        }
    }
}

/// Reduced Helmholtz energy and its partial derivatives up to second order.
///
/// Subscripts denote partial derivatives, i.e., `a_dt` is
/// $\frac{\partial^2\alpha}{\partial\delta\partial\tau}$.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HelmholtzDerivatives {
    pub a: f64,
    pub a_d: f64,
    pub a_t: f64,
    pub a_dd: f64,
    pub a_tt: f64,
    pub a_dt: f64,
}

impl HelmholtzDerivatives {
    /// Evaluate all derivatives of `f` at the given reduced variables
    /// using three evaluations with hyper-dual numbers.
    pub fn from_fn<F>(f: F, rv: ReducedVariables) -> Self
    where
        F: Fn(HyperDual64, HyperDual64) -> HyperDual64,
    {
        let delta = HyperDual64::from_re(rv.delta);
        let tau = HyperDual64::from_re(rv.tau);
        let dd = f(delta.derivative1().derivative2(), tau);
        let tt = f(delta, tau.derivative1().derivative2());
        let dt = f(delta.derivative1(), tau.derivative2());
        Self {
            a: dd.re,
            a_d: dd.eps1,
            a_t: tt.eps1,
            a_dd: dd.eps1eps2,
            a_tt: tt.eps1eps2,
            a_dt: dt.eps1eps2,
        }
    }
}

impl Add for HelmholtzDerivatives {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            a: self.a + rhs.a,
            a_d: self.a_d + rhs.a_d,
            a_t: self.a_t + rhs.a_t,
            a_dd: self.a_dd + rhs.a_dd,
            a_tt: self.a_tt + rhs.a_tt,
            a_dt: self.a_dt + rhs.a_dt,
        }
    }
}

/// Third order density derivatives of the reduced residual Helmholtz energy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThirdDerivatives {
    pub a_ddd: f64,
    pub a_ddt: f64,
}

impl ThirdDerivatives {
    pub fn from_fn<F>(f: F, rv: ReducedVariables) -> Self
    where
        F: Fn(HyperHyperDual64, HyperHyperDual64) -> HyperHyperDual64,
    {
        let delta = HyperHyperDual64::from_re(rv.delta);
        let tau = HyperHyperDual64::from_re(rv.tau);
        let ddd = f(delta.derivative1().derivative2().derivative3(), tau);
        let ddt = f(delta.derivative1().derivative2(), tau.derivative3());
        Self {
            a_ddd: ddd.eps1eps2eps3,
            a_ddt: ddt.eps1eps2eps3,
        }
    }
}
