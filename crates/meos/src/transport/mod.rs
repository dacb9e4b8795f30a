//! Transport and interfacial property correlations.
//!
//! Correlations are stored per fluid and evaluated in SI units. Thermal
//! conductivity correlations may include the critical enhancement of
//! Olchowy and Sengers. Fluids without correlations of their own can map
//! onto a reference fluid with the extended corresponding states model.
use meos_core::{MeosError, MeosResult};
use serde::{Deserialize, Serialize};

mod critical_enhancement;
pub mod dilute;
pub mod ecs;
mod surface_tension;
mod thermal_conductivity;
mod viscosity;
pub use critical_enhancement::OlchowySengers;
pub use dilute::LennardJones;
pub use ecs::{EcsMapping, EcsRecord, ShapeFactors};
pub use surface_tension::SurfaceTensionCorrelation;
pub use thermal_conductivity::ThermalConductivityCorrelation;
pub use viscosity::ViscosityCorrelation;

/// Empirical correlation
/// $X=X^0(T)+\sum_in_i\tau^{t_i}\delta^{d_i}\exp\left(-g_i\delta^{l_i}\right)$.
///
/// The sum is in µPa s for viscosities and mW/(m K) for thermal
/// conductivities. Terms with $d_i=0$ belong to the dilute gas. If
/// Lennard-Jones parameters are given, the kinetic theory result is
/// added as $X^0$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolynomialTerms {
    pub n: Vec<f64>,
    pub t: Vec<f64>,
    pub d: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub g: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub l: Vec<f64>,
    /// Reducing temperature, defaults to the critical temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_red: Option<f64>,
    /// Reducing density, defaults to the critical density.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_red: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lennard_jones: Option<LennardJones>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PolynomialTerms {
    fn validate(&self) -> MeosResult<()> {
        let len = self.n.len();
        let consistent = self.t.len() == len
            && self.d.len() == len
            && (self.g.is_empty() || self.g.len() == len)
            && (self.l.is_empty() || self.l.len() == len);
        if !consistent {
            return Err(MeosError::Configuration(format!(
                "polynomial transport correlation with {len} coefficients and {}/{}/{}/{} exponents",
                self.t.len(),
                self.d.len(),
                self.g.len(),
                self.l.len()
            )));
        }
        Ok(())
    }

    /// Value of the sum, restricted to the dilute gas terms if `dilute` is set.
    fn sum(&self, temperature: f64, density: f64, critical: (f64, f64), dilute: bool) -> f64 {
        let tau = self.t_red.unwrap_or(critical.0) / temperature;
        let delta = density / self.rho_red.unwrap_or(critical.1);
        (0..self.n.len())
            .filter(|&i| !dilute || self.d[i] == 0.0)
            .map(|i| {
                let g = self.g.get(i).copied().unwrap_or(0.0);
                let l = self.l.get(i).copied().unwrap_or(0.0);
                let mut term = self.n[i] * tau.powf(self.t[i]) * delta.powf(self.d[i]);
                if g != 0.0 {
                    term *= (-g * delta.powf(l)).exp();
                }
                term
            })
            .sum()
    }
}

fn missing(property: &str, fluid: &str) -> MeosError {
    MeosError::PropertyUnavailable(format!("no {property} correlation for {fluid}"))
}
