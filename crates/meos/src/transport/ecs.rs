//! Extended corresponding states (ECS) for transport properties.
//!
//! The state $(T,\rho)$ of the target fluid is mapped onto the
//! conformal state $(T_0,\rho_0)=(T/f,\rho h)$ of a reference fluid with
//! the equivalent substance reducing ratios
//! $f=\frac{T_c}{T_{c,0}}\theta$ and $h=\frac{\rho_{c,0}}{\rho_c}\phi$.
//! The transport property of the reference fluid is then rescaled with
//! $F_\eta=\sqrt{f}h^{-2/3}\sqrt{M/M_0}$ or $F_\lambda=\sqrt{f}h^{-2/3}\sqrt{M_0/M}$.
//!
//! Shape factors are either empirical polynomials or obtained exactly from
//! the equality of the residual Helmholtz energy and the compressibility
//! factor of both fluids. The exact solution is ill-defined at vanishing
//! density, where both fluids approach the ideal gas.
use super::dilute::eucken;
use super::thermal_conductivity::EUCKEN_FACTOR;
use super::{LennardJones, OlchowySengers, missing};
use crate::multiparameter::MultiParameter;
use meos_core::{HelmholtzEnergy, HelmholtzEnergyDyn, MeosError, MeosResult, State, Transport};
use nalgebra::{Matrix2, Vector2};
use quantity::{KELVIN, METER, MOL, PASCAL, SECOND};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_ITER_CONFORMAL: usize = 50;
const CONFORMAL_TOL: f64 = 1e-12;
/// Maximum step of the conformal iteration in $\ln T_0$ and $\ln\rho_0$.
const MAX_LOG_STEP: f64 = 0.5;

/// Shape factor $\sum_in_iT_r^{t_i}\delta^{d_i}$ of the target fluid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapePolynomial {
    pub n: Vec<f64>,
    pub t: Vec<f64>,
    pub d: Vec<f64>,
}

impl ShapePolynomial {
    fn identity() -> Self {
        Self {
            n: vec![1.0],
            t: vec![0.0],
            d: vec![0.0],
        }
    }

    fn evaluate(&self, reduced_temperature: f64, delta: f64) -> f64 {
        self.n
            .iter()
            .zip(&self.t)
            .zip(&self.d)
            .map(|((n, t), d)| n * reduced_temperature.powf(*t) * delta.powf(*d))
            .sum()
    }
}

/// Equivalent substance reducing ratios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeFactors {
    /// Empirical shape factors $\theta$ and $\phi$.
    Polynomial {
        #[serde(default = "ShapePolynomial::identity")]
        theta: ShapePolynomial,
        #[serde(default = "ShapePolynomial::identity")]
        phi: ShapePolynomial,
    },
    /// Exact shape factors from $\alpha^\mathrm{r}_0(T_0,\rho_0)=\alpha^\mathrm{r}(T,\rho)$
    /// and $Z_0(T_0,\rho_0)=Z(T,\rho)$.
    Conformal,
}

/// Density polynomial $\sum_in_i\delta^{d_i}$, used for the viscosity
/// ($\psi$) and thermal conductivity ($\chi$) shape functions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityPolynomial {
    pub n: Vec<f64>,
    pub d: Vec<f64>,
}

impl Default for DensityPolynomial {
    fn default() -> Self {
        Self {
            n: vec![1.0],
            d: vec![0.0],
        }
    }
}

impl DensityPolynomial {
    fn evaluate(&self, delta: f64) -> f64 {
        self.n.iter().zip(&self.d).map(|(n, d)| n * delta.powf(*d)).sum()
    }
}

/// Temperature polynomial $\sum_in_iT^{t_i}$ for the Eucken factor $f_\mathrm{int}$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePolynomial {
    pub n: Vec<f64>,
    pub t: Vec<f64>,
}

impl Default for TemperaturePolynomial {
    fn default() -> Self {
        Self {
            n: vec![EUCKEN_FACTOR],
            t: vec![0.0],
        }
    }
}

impl TemperaturePolynomial {
    fn evaluate(&self, temperature: f64) -> f64 {
        self.n
            .iter()
            .zip(&self.t)
            .map(|(n, t)| n * temperature.powf(*t))
            .sum()
    }
}

/// ECS parameters as stored in parameter files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcsRecord {
    /// Identifier of the reference fluid in the same parameter file.
    pub reference_fluid: String,
    /// Equation of state of the reference fluid, defaults to its first one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
    pub shape_factors: ShapeFactors,
    #[serde(default)]
    pub psi: DensityPolynomial,
    #[serde(default)]
    pub chi: DensityPolynomial,
    #[serde(default)]
    pub f_int: TemperaturePolynomial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lennard_jones: Option<LennardJones>,
    /// Critical enhancement of the thermal conductivity of the target fluid.
    ///
    /// Only the background of the reference correlation is mapped, so the
    /// ECS thermal conductivity has no critical enhancement without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_enhancement: Option<OlchowySengers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl EcsRecord {
    fn validate(&self) -> MeosResult<()> {
        let mut lengths = vec![
            ("psi", self.psi.n.len(), self.psi.d.len()),
            ("chi", self.chi.n.len(), self.chi.d.len()),
            ("f_int", self.f_int.n.len(), self.f_int.t.len()),
        ];
        if let ShapeFactors::Polynomial { theta, phi } = &self.shape_factors {
            lengths.push(("theta", theta.n.len(), theta.t.len().min(theta.d.len())));
            lengths.push(("phi", phi.n.len(), phi.t.len().min(phi.d.len())));
            if theta.t.len() != theta.d.len() || phi.t.len() != phi.d.len() {
                return Err(MeosError::Configuration(
                    "ECS shape factor exponents differ in length".into(),
                ));
            }
        }
        if let Some((name, _, _)) = lengths.iter().find(|(_, n, e)| n != e || *n == 0) {
            return Err(MeosError::Configuration(format!(
                "ECS polynomial `{name}` with inconsistent coefficients"
            )));
        }
        Ok(())
    }
}

/// Mapping of a fluid onto a reference fluid.
#[derive(Clone, Debug)]
pub struct EcsMapping {
    reference_fluid: Arc<MultiParameter>,
    record: EcsRecord,
}

/// Conformal state of the reference fluid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConformalState {
    /// Temperature of the reference fluid in K
    pub temperature: f64,
    /// Density of the reference fluid in mol/m³
    pub density: f64,
    /// $f=T/T_0$
    pub f: f64,
    /// $h=\rho_0/\rho$
    pub h: f64,
}

impl EcsMapping {
    pub fn new(record: EcsRecord, reference_fluid: Arc<MultiParameter>) -> MeosResult<Self> {
        record.validate()?;
        Ok(Self {
            reference_fluid,
            record,
        })
    }

    pub fn reference_fluid(&self) -> &Arc<MultiParameter> {
        &self.reference_fluid
    }

    pub fn record(&self) -> &EcsRecord {
        &self.record
    }

    pub fn lennard_jones(&self) -> Option<LennardJones> {
        self.record.lennard_jones
    }

    /// Map the state of the target fluid onto the reference fluid.
    pub fn conformal_state(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<ConformalState> {
        let target = fluid.critical_constants();
        let reference = self.reference_fluid.critical_constants();
        let (t0, rho0) = match &self.record.shape_factors {
            ShapeFactors::Polynomial { theta, phi } => {
                let tr = temperature / target.temperature;
                let delta = density / target.density;
                let f = target.temperature / reference.temperature * theta.evaluate(tr, delta);
                let h = reference.density / target.density * phi.evaluate(tr, delta);
                (temperature / f, density * h)
            }
            ShapeFactors::Conformal => self.solve_conformal(fluid, temperature, density)?,
        };
        if !(t0 > 0.0 && rho0 > 0.0 && t0.is_finite() && rho0.is_finite()) {
            return Err(MeosError::IterationFailed(String::from("ECS shape factors")));
        }
        Ok(ConformalState {
            temperature: t0,
            density: rho0,
            f: temperature / t0,
            h: rho0 / density,
        })
    }

    fn solve_conformal(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<(f64, f64)> {
        let target = fluid.critical_constants();
        let reference_fluid = &*self.reference_fluid;
        let reference = reference_fluid.critical_constants();

        let r = fluid.residual_derivatives(fluid.reduced_variables(temperature, density));
        let delta = fluid.reduced_variables(temperature, density).delta;
        let (a_target, z_target) = (r.a, 1.0 + delta * r.a_d);

        let mut x = Vector2::new(
            (temperature * reference.temperature / target.temperature).ln(),
            (density * reference.density / target.density).ln(),
        );
        for _ in 0..MAX_ITER_CONFORMAL {
            let (t0, rho0) = (x[0].exp(), x[1].exp());
            let rv = reference_fluid.reduced_variables(t0, rho0);
            let r0 = reference_fluid.residual_derivatives(rv);
            let (d, tau) = (rv.delta, rv.tau);
            let residual = Vector2::new(r0.a - a_target, d * r0.a_d + 1.0 - z_target);
            if residual.amax() < CONFORMAL_TOL {
                return Ok((t0, rho0));
            }
            // derivatives with respect to ln T0 and ln rho0
            let jacobian = Matrix2::new(
                -tau * r0.a_t,
                d * r0.a_d,
                -tau * d * r0.a_dt,
                d * r0.a_d + d * d * r0.a_dd,
            );
            let mut step = jacobian
                .try_inverse()
                .ok_or_else(|| MeosError::IterationFailed(String::from("ECS conformal state")))?
                * residual;
            let max_step = step.amax();
            if !max_step.is_finite() {
                return Err(MeosError::IterationFailed(String::from(
                    "ECS conformal state",
                )));
            }
            if max_step > MAX_LOG_STEP {
                step *= MAX_LOG_STEP / max_step;
            }
            x -= step;
        }
        Err(MeosError::not_converged(
            "ECS conformal state",
            MAX_ITER_CONFORMAL,
            x[0].exp(),
        ))
    }

    fn reference_state(&self, temperature: f64, density: f64) -> MeosResult<State<&MultiParameter>> {
        State::new_pure(
            &&*self.reference_fluid,
            temperature * KELVIN,
            density * MOL / (METER * METER * METER),
        )
    }

    fn unavailable(&self, fluid: &MultiParameter, property: &str, error: MeosError) -> MeosError {
        MeosError::PropertyUnavailable(format!(
            "ECS {property} of {} with reference fluid {}: {error}",
            fluid.name(),
            self.reference_fluid.name()
        ))
    }

    /// Viscosity in Pa s.
    pub fn viscosity(&self, fluid: &MultiParameter, temperature: f64, density: f64) -> MeosResult<f64> {
        self.viscosity_inner(fluid, temperature, density)
            .map_err(|e| match e {
                MeosError::PropertyUnavailable(_) => e,
                e => self.unavailable(fluid, "viscosity", e),
            })
    }

    fn viscosity_inner(&self, fluid: &MultiParameter, temperature: f64, density: f64) -> MeosResult<f64> {
        let cs = self.conformal_state(fluid, temperature, density)?;
        let delta = density / fluid.critical_constants().density;
        let state = self.reference_state(cs.temperature, cs.density * self.record.psi.evaluate(delta))?;
        let eta_ref = self
            .reference_fluid
            .viscosity(state.temperature, state.density)?
            .convert_into(PASCAL * SECOND);
        let m_ratio = fluid.molar_weight() / self.reference_fluid.molar_weight();
        let f_eta = cs.f.sqrt() * cs.h.powf(-2.0 / 3.0) * m_ratio.sqrt();
        match self.record.lennard_jones {
            None => Ok(eta_ref * f_eta),
            Some(lj) => {
                let eta_ref_dilute = self
                    .reference_fluid
                    .viscosity_correlation()
                    .ok_or_else(|| missing("viscosity", self.reference_fluid.name()))?
                    .dilute(&self.reference_fluid, cs.temperature)?;
                Ok(lj.viscosity(fluid.molar_weight(), temperature) + (eta_ref - eta_ref_dilute) * f_eta)
            }
        }
    }

    /// Thermal conductivity in W/(m K).
    pub fn thermal_conductivity(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<f64> {
        self.thermal_conductivity_inner(fluid, temperature, density)
            .map_err(|e| match e {
                MeosError::PropertyUnavailable(_) => e,
                e => self.unavailable(fluid, "thermal conductivity", e),
            })
    }

    fn thermal_conductivity_inner(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
        density: f64,
    ) -> MeosResult<f64> {
        let cs = self.conformal_state(fluid, temperature, density)?;
        let delta = density / fluid.critical_constants().density;
        let state = self.reference_state(cs.temperature, cs.density * self.record.chi.evaluate(delta))?;
        let reference_correlation = self
            .reference_fluid
            .thermal_conductivity_correlation()
            .ok_or_else(|| missing("thermal conductivity", self.reference_fluid.name()))?;
        let lambda_ref = reference_correlation.background(
            &self.reference_fluid,
            state.temperature.convert_into(KELVIN),
            state.density.convert_into(MOL / (METER * METER * METER)),
        )?;
        let m_ratio = self.reference_fluid.molar_weight() / fluid.molar_weight();
        let f_lambda = cs.f.sqrt() * cs.h.powf(-2.0 / 3.0) * m_ratio.sqrt();
        let background = match self.dilute_thermal_conductivity(fluid, temperature) {
            None => lambda_ref * f_lambda,
            Some(lambda_dilute) => {
                let lambda_ref_dilute =
                    reference_correlation.dilute(&self.reference_fluid, cs.temperature)?;
                lambda_dilute + (lambda_ref - lambda_ref_dilute) * f_lambda
            }
        };
        let enhancement = match &self.record.critical_enhancement {
            Some(enhancement) => {
                let viscosity = fluid.viscosity_si(temperature, density)?;
                enhancement.evaluate(fluid, temperature, density, viscosity)?
            }
            None => 0.0,
        };
        Ok(background + enhancement)
    }

    /// Modified Eucken conductivity of the target fluid if Lennard-Jones
    /// parameters are available.
    pub(crate) fn dilute_thermal_conductivity(
        &self,
        fluid: &MultiParameter,
        temperature: f64,
    ) -> Option<f64> {
        let lj = self.record.lennard_jones?;
        let molar_weight = fluid.molar_weight();
        Some(eucken(
            lj.viscosity(molar_weight, temperature),
            molar_weight,
            fluid.ideal_gas_heat_capacity(temperature),
            fluid.gas_constant(),
            self.record.f_int.evaluate(temperature),
        ))
    }
}
