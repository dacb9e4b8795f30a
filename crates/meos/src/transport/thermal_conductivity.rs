use super::dilute::eucken;
use super::{LennardJones, OlchowySengers, PolynomialTerms, missing};
use crate::multiparameter::MultiParameter;
use meos_core::{HelmholtzEnergyDyn, MeosError, MeosResult};
use serde::{Deserialize, Serialize};

const BAR: f64 = 1e5;
/// Factor of the internal degrees of freedom in the modified Eucken correlation.
pub(crate) const EUCKEN_FACTOR: f64 = 1.32;

/// Thermal conductivity correlations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThermalConductivityCorrelation {
    /// Residual conductivity of Stiel and Thodos (1964) on top of the
    /// modified Eucken dilute gas conductivity.
    StielThodos {
        lennard_jones: LennardJones,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        critical_enhancement: Option<OlchowySengers>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    /// Polynomial in mW/(m K).
    Polynomial {
        #[serde(flatten)]
        terms: PolynomialTerms,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        critical_enhancement: Option<OlchowySengers>,
    },
    /// Extended corresponding states with the mapping of the fluid.
    Ecs,
}

impl ThermalConductivityCorrelation {
    pub fn validate(&self) -> MeosResult<()> {
        match self {
            Self::Polynomial { terms, .. } => terms.validate(),
            _ => Ok(()),
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::StielThodos { reference, .. } => reference.as_deref(),
            Self::Polynomial { terms, .. } => terms.reference.as_deref(),
            Self::Ecs => None,
        }
    }

    fn critical_enhancement(&self) -> Option<&OlchowySengers> {
        match self {
            Self::StielThodos {
                critical_enhancement,
                ..
            }
            | Self::Polynomial {
                critical_enhancement,
                ..
            } => critical_enhancement.as_ref(),
            Self::Ecs => None,
        }
    }

    /// Thermal conductivity in W/(m K).
    pub(crate) fn evaluate(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<f64> {
        let background = self.background(fluid, temperature, density)?;
        let enhancement = match self.critical_enhancement() {
            Some(enhancement) => {
                let viscosity = fluid.viscosity_si(temperature, density)?;
                enhancement.evaluate(fluid, temperature, density, viscosity)?
            }
            None => 0.0,
        };
        Ok(background + enhancement)
    }

    /// Thermal conductivity without the critical enhancement in W/(m K).
    pub(crate) fn background(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<f64> {
        match self {
            Self::StielThodos { .. } => {
                let critical = fluid.critical_constants();
                let molar_weight = fluid.molar_weight() * 1e3;
                let rho_r = density / critical.density;
                let zc = critical.pressure
                    / (critical.density * fluid.gas_constant() * critical.temperature);
                // W/(m K) with M in g/mol and pc in bar
                let gamma = 210.0
                    * (critical.temperature * molar_weight.powi(3)
                        / (critical.pressure / BAR).powi(4))
                    .powf(1.0 / 6.0);
                let residual = if rho_r < 0.5 {
                    1.22e-2 * ((0.535 * rho_r).exp() - 1.0)
                } else if rho_r < 2.0 {
                    1.14e-2 * ((0.67 * rho_r).exp() - 1.069)
                } else {
                    2.60e-3 * ((1.155 * rho_r).exp() + 2.016)
                };
                Ok(self.dilute(fluid, temperature)? + residual / (gamma * zc.powi(5)))
            }
            Self::Polynomial { terms, .. } => {
                let critical = fluid.critical_constants();
                let lambda0 = match terms.lennard_jones {
                    Some(lj) => dilute_eucken(fluid, &lj, temperature),
                    None => 0.0,
                };
                let sum = terms.sum(
                    temperature,
                    density,
                    (critical.temperature, critical.density),
                    false,
                );
                Ok(lambda0 + sum * 1e-3)
            }
            Self::Ecs => fluid
                .ecs()
                .ok_or_else(|| missing("ECS", fluid.name()))?
                .thermal_conductivity(fluid, temperature, density),
        }
    }

    /// Dilute gas thermal conductivity in W/(m K).
    pub(crate) fn dilute(&self, fluid: &MultiParameter, temperature: f64) -> MeosResult<f64> {
        match self {
            Self::StielThodos { lennard_jones, .. } => {
                Ok(dilute_eucken(fluid, lennard_jones, temperature))
            }
            Self::Polynomial { terms, .. } => {
                let critical = fluid.critical_constants();
                let lambda0 = match terms.lennard_jones {
                    Some(lj) => dilute_eucken(fluid, &lj, temperature),
                    None => 0.0,
                };
                let sum = terms.sum(
                    temperature,
                    0.0,
                    (critical.temperature, critical.density),
                    true,
                );
                Ok(lambda0 + sum * 1e-3)
            }
            Self::Ecs => fluid
                .ecs()
                .and_then(|ecs| ecs.dilute_thermal_conductivity(fluid, temperature))
                .ok_or_else(|| {
                    MeosError::PropertyUnavailable(format!(
                        "dilute gas thermal conductivity of {} without Lennard-Jones parameters",
                        fluid.name()
                    ))
                }),
        }
    }
}

fn dilute_eucken(fluid: &MultiParameter, lennard_jones: &LennardJones, temperature: f64) -> f64 {
    let molar_weight = fluid.molar_weight();
    eucken(
        lennard_jones.viscosity(molar_weight, temperature),
        molar_weight,
        fluid.ideal_gas_heat_capacity(temperature),
        fluid.gas_constant(),
        EUCKEN_FACTOR,
    )
}
