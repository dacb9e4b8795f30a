use super::{LennardJones, PolynomialTerms, missing};
use crate::multiparameter::MultiParameter;
use meos_core::{HelmholtzEnergyDyn, MeosError, MeosResult};
use serde::{Deserialize, Serialize};

const ATMOSPHERE: f64 = 101325.0;

/// Viscosity correlations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViscosityCorrelation {
    /// Residual viscosity of Jossi, Stiel and Thodos (1962) on top of the
    /// Chapman-Enskog dilute gas viscosity.
    JossiStielThodos {
        lennard_jones: LennardJones,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    /// Polynomial in µPa s.
    Polynomial(PolynomialTerms),
    /// Extended corresponding states with the mapping of the fluid.
    Ecs,
}

impl ViscosityCorrelation {
    pub fn validate(&self) -> MeosResult<()> {
        match self {
            Self::Polynomial(terms) => terms.validate(),
            _ => Ok(()),
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::JossiStielThodos { reference, .. } => reference.as_deref(),
            Self::Polynomial(terms) => terms.reference.as_deref(),
            Self::Ecs => None,
        }
    }

    /// Viscosity in Pa s.
    pub(crate) fn evaluate(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<f64> {
        let critical = fluid.critical_constants();
        match self {
            Self::JossiStielThodos { lennard_jones, .. } => {
                let molar_weight = fluid.molar_weight();
                let eta0 = lennard_jones.viscosity(molar_weight, temperature);
                let rho_r = density / critical.density;
                // in cP with M in g/mol and pc in atm
                let xi = critical.temperature.powf(1.0 / 6.0)
                    / ((molar_weight * 1e3).sqrt()
                        * (critical.pressure / ATMOSPHERE).powf(2.0 / 3.0));
                let poly = 0.1023
                    + rho_r * (0.023364 + rho_r * (0.058533 + rho_r * (-0.040758 + rho_r * 0.0093324)));
                Ok(eta0 + (poly.powi(4) - 1e-4) / xi * 1e-3)
            }
            Self::Polynomial(terms) => {
                let eta0 = terms
                    .lennard_jones
                    .map_or(0.0, |lj| lj.viscosity(fluid.molar_weight(), temperature));
                let sum = terms.sum(
                    temperature,
                    density,
                    (critical.temperature, critical.density),
                    false,
                );
                Ok(eta0 + sum * 1e-6)
            }
            Self::Ecs => fluid
                .ecs()
                .ok_or_else(|| missing("ECS", fluid.name()))?
                .viscosity(fluid, temperature, density),
        }
    }

    /// Dilute gas viscosity in Pa s.
    pub(crate) fn dilute(&self, fluid: &MultiParameter, temperature: f64) -> MeosResult<f64> {
        let critical = fluid.critical_constants();
        match self {
            Self::JossiStielThodos { lennard_jones, .. } => {
                Ok(lennard_jones.viscosity(fluid.molar_weight(), temperature))
            }
            Self::Polynomial(terms) => {
                let eta0 = terms
                    .lennard_jones
                    .map_or(0.0, |lj| lj.viscosity(fluid.molar_weight(), temperature));
                let sum = terms.sum(
                    temperature,
                    0.0,
                    (critical.temperature, critical.density),
                    true,
                );
                Ok(eta0 + sum * 1e-6)
            }
            Self::Ecs => fluid
                .ecs()
                .and_then(|ecs| ecs.lennard_jones())
                .map(|lj| lj.viscosity(fluid.molar_weight(), temperature))
                .ok_or_else(|| {
                    MeosError::PropertyUnavailable(format!(
                        "dilute gas viscosity of {} without Lennard-Jones parameters",
                        fluid.name()
                    ))
                }),
        }
    }
}
