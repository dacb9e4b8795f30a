use super::dilute::KB;
use crate::multiparameter::MultiParameter;
use meos_core::{Contributions, HelmholtzEnergy, HelmholtzEnergyDyn, MeosResult, State};
use quantity::{JOULE, KELVIN, METER, MOL};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Critical enhancement of the thermal conductivity by Olchowy and Sengers (1989).
///
/// The defaults are the generic values of Perkins et al. (2013).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlchowySengers {
    /// Critical exponent $\nu$
    pub nu: f64,
    /// Critical exponent $\gamma$
    pub gamma: f64,
    /// Universal amplitude $R_D$
    pub r_d: f64,
    /// Correlation length amplitude $\xi_0$ in m
    pub xi0: f64,
    /// Amplitude $\Gamma$ of the susceptibility
    pub big_gamma: f64,
    /// Effective cutoff wavelength $q_D^{-1}$ in m
    pub qd_inverse: f64,
    /// Reference temperature in K, defaults to $1.5T_c$
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_ref: Option<f64>,
}

impl Default for OlchowySengers {
    fn default() -> Self {
        Self {
            nu: 0.63,
            gamma: 1.239,
            r_d: 1.02,
            xi0: 0.194e-9,
            big_gamma: 0.0496,
            qd_inverse: 0.5e-9,
            t_ref: None,
        }
    }
}

impl OlchowySengers {
    /// Enhancement in W/(m K) with the viscosity of the state in Pa s.
    pub fn evaluate(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
        viscosity: f64,
    ) -> MeosResult<f64> {
        let critical = fluid.critical_constants();
        let t_ref = self.t_ref.unwrap_or(1.5 * critical.temperature);
        let (_, dp_drho) = fluid.p_dpdrho(temperature, density);
        let (_, dp_drho_ref) = fluid.p_dpdrho(t_ref, density);
        if dp_drho <= 0.0 || dp_drho_ref <= 0.0 {
            return Ok(0.0);
        }
        let scale = critical.pressure * density / critical.density.powi(2);
        let delta_chi = scale * (1.0 / dp_drho - t_ref / temperature / dp_drho_ref);
        if delta_chi <= 0.0 {
            return Ok(0.0);
        }
        let xi = self.xi0 * (delta_chi / self.big_gamma).powf(self.nu / self.gamma);
        let y = xi / self.qd_inverse;

        let state = State::new_pure(
            &fluid,
            temperature * KELVIN,
            density * MOL / (METER * METER * METER),
        )?;
        let unit = JOULE / (MOL * KELVIN);
        let cp = state
            .molar_isobaric_heat_capacity(Contributions::Total)
            .convert_into(unit);
        let cv = state
            .molar_isochoric_heat_capacity(Contributions::Total)
            .convert_into(unit);

        let omega = 2.0 / PI * ((cp - cv) / cp * y.atan() + cv / cp * y);
        let y_rho = y * critical.density / density;
        let omega0 = 2.0 / PI * (1.0 - (-1.0 / (1.0 / y + y_rho * y_rho / 3.0)).exp());
        Ok(density * cp * self.r_d * KB * temperature / (6.0 * PI * viscosity * xi)
            * (omega - omega0))
    }
}
