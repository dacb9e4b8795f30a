use meos_core::{MeosError, MeosResult};
use serde::{Deserialize, Serialize};

/// Surface tension correlation of Mulero and Cachadiña (2012)
/// $\sigma=\sum_i\sigma_i\left(1-\frac{T}{T_c}\right)^{n_i}$ in N/m.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTensionCorrelation {
    pub sigma: Vec<f64>,
    pub n: Vec<f64>,
    /// Critical temperature of the correlation, defaults to the one of the equation of state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SurfaceTensionCorrelation {
    pub fn validate(&self, tc: f64) -> MeosResult<Self> {
        if self.sigma.is_empty() || self.sigma.len() != self.n.len() {
            return Err(MeosError::Configuration(format!(
                "surface tension correlation with {} coefficients and {} exponents",
                self.sigma.len(),
                self.n.len()
            )));
        }
        Ok(Self {
            tc: Some(self.tc.unwrap_or(tc)),
            ..self.clone()
        })
    }

    pub fn evaluate(&self, temperature: f64) -> MeosResult<f64> {
        let tc = self.tc.unwrap_or(f64::NAN);
        if !(temperature > 0.0 && temperature <= tc) {
            return Err(MeosError::PropertyUnavailable(format!(
                "surface tension at T = {temperature} K"
            )));
        }
        let theta = 1.0 - temperature / tc;
        Ok(self
            .sigma
            .iter()
            .zip(&self.n)
            .map(|(s, n)| s * theta.powf(*n))
            .sum())
    }
}
