//! Dilute gas contributions from kinetic theory.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Boltzmann constant in J/K
pub const KB: f64 = 1.380649e-23;
/// Avogadro constant in 1/mol
pub const NAV: f64 = 6.02214076e23;
const ANGSTROM: f64 = 1e-10;

/// Lennard-Jones parameters of a fluid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LennardJones {
    /// Collision diameter in Å
    pub sigma: f64,
    /// Energy parameter in K
    pub epsilon_k: f64,
}

/// Collision integral $\Omega^{(2,2)*}$ of Neufeld et al. (1972).
pub fn omega22(t: f64) -> f64 {
    1.16145 * t.powf(-0.14874) + 0.52487 * (-0.77320 * t).exp() + 2.16178 * (-2.43787 * t).exp()
        - 6.435e-4 * t.powf(0.14874) * (18.0323 * t.powf(-0.76830) - 7.27371).sin()
}

impl LennardJones {
    /// Chapman-Enskog viscosity in Pa s with the molar weight in kg/mol.
    pub fn viscosity(&self, molar_weight: f64, temperature: f64) -> f64 {
        let m = molar_weight / NAV;
        let sigma = self.sigma * ANGSTROM;
        5.0 / 16.0 * (m * KB * temperature / PI).sqrt()
            / (sigma * sigma * omega22(temperature / self.epsilon_k))
    }
}

/// Modified Eucken thermal conductivity of a dilute gas in W/(m K).
///
/// `cp0` is the ideal gas heat capacity in J/(mol K), `f_int` the
/// factor of the internal degrees of freedom.
pub fn eucken(viscosity: f64, molar_weight: f64, cp0: f64, gas_constant: f64, f_int: f64) -> f64 {
    viscosity / molar_weight * (f_int * (cp0 - 2.5 * gas_constant) + 3.75 * gas_constant)
}
