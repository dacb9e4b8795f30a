//! Description of a thermodynamic state of a pure fluid.
//!
//! A state is defined by
//! * a temperature
//! * a molar density
//!
//! and, inside the two-phase region, by the vapor quality together with
//! the saturated liquid and vapor states. All properties are computed
//! from the derivatives of the reduced Helmholtz energy at $(\delta,\tau)$.
use crate::equation_of_state::HelmholtzEnergy;
use crate::errors::{MeosError, MeosResult};
use crate::phase_equilibria::PhaseEquilibrium;
use crate::SolverOptions;
use quantity::*;
use std::fmt;
use std::sync::OnceLock;

mod builder;
mod cache;
mod flash;
mod properties;
pub use builder::StateBuilder;
pub(crate) use cache::Cache;

/// Possible contributions that can be computed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contributions {
    /// Only compute the ideal gas contribution
    IdealGas,
    /// Only compute the difference between the total and the ideal gas contribution
    Residual,
    /// Compute ideal gas and residual contributions
    Total,
}

/// Initial values in a density iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DensityInitialization<D = Density> {
    /// Calculate a vapor phase by initializing using the ideal gas.
    Vapor,
    /// Calculate a liquid phase by using the `max_density`.
    Liquid,
    /// Use the given density as initial value.
    InitialDensity(D),
}

impl DensityInitialization {
    pub fn into_si(self) -> DensityInitialization<f64> {
        match self {
            Self::Vapor => DensityInitialization::Vapor,
            Self::Liquid => DensityInitialization::Liquid,
            Self::InitialDensity(d) => {
                DensityInitialization::InitialDensity(d.convert_into(MOL / (METER * METER * METER)))
            }
        }
    }
}

/// Phase of a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Liquid,
    Vapor,
    /// Temperature at or above the critical temperature.
    Supercritical,
    /// Inside the vapor-liquid dome.
    TwoPhase,
    Critical,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Liquid => "liquid",
            Self::Vapor => "vapor",
            Self::Supercritical => "supercritical",
            Self::TwoPhase => "two-phase",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Vapor quality and coexisting phases of a two-phase state.
#[derive(Clone, Debug)]
pub struct TwoPhaseState<E> {
    /// Molar vapor fraction $x=\frac{v-v'}{v''-v'}$
    pub quality: f64,
    /// Saturated vapor and liquid
    pub vle: PhaseEquilibrium<E, 2>,
}

/// Thermodynamic state of a pure fluid.
///
/// # Contents
///
/// + [State properties](#state-properties)
/// + [Mass specific state properties](#mass-specific-state-properties)
/// + [Transport properties](#transport-properties)
/// + [State constructors](#state-constructors)
/// + [Flash calculations](#flash-calculations)
#[derive(Debug, Clone)]
pub struct State<E> {
    /// Equation of state
    pub eos: E,
    /// Temperature $T$
    pub temperature: Temperature,
    /// Molar density $\rho$
    pub density: Density,
    /// Molar volume $v=\frac{1}{\rho}$
    pub molar_volume: MolarVolume,
    /// temperature in K
    t: f64,
    /// density in mol/m³
    rho: f64,
    phase: OnceLock<Phase>,
    two_phase: Option<Box<TwoPhaseState<E>>>,
    cache: Cache,
}

impl<E: HelmholtzEnergy> fmt::Display for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T = {:.5}, ρ = {:.5}, phase = {}",
            self.temperature,
            self.density,
            self.phase()
        )?;
        if let Some(x) = self.vapor_quality() {
            write!(f, ", x = {x:.5}")?;
        }
        Ok(())
    }
}

/// # State constructors
impl<E: HelmholtzEnergy> State<E> {
    /// Return a new `State` given a temperature and a molar density.
    ///
    /// This function will perform a validation of the given properties, i.e. test for signs
    /// and if values are finite. It will **not** validate physics, i.e. the state
    /// can be metastable or unstable and is not checked against the limits of the model.
    pub fn new_pure(eos: &E, temperature: Temperature, density: Density) -> MeosResult<Self> {
        let t = temperature.convert_into(KELVIN);
        let rho = density.convert_into(MOL / (METER * METER * METER));
        validate(t, rho)?;
        Ok(Self::new_unchecked(eos, t, rho))
    }

    /// Return a new `State` given a temperature and a molar density.
    ///
    /// Below the critical temperature, a density between the saturated
    /// densities results in a two-phase state, split by the lever rule.
    pub fn new_trho(eos: &E, temperature: Temperature, density: Density) -> MeosResult<Self> {
        let t = temperature.convert_into(KELVIN);
        let rho = density.convert_into(MOL / (METER * METER * METER));
        validate(t, rho)?;
        let limits = eos.limits();
        limits.validate_temperature(t)?;
        let state = Self::resolve_two_phase(eos, t, rho)?;
        limits.validate_pressure(state.p_si())?;
        Ok(state)
    }

    /// Split the state into saturated liquid and vapor if the density lies
    /// inside the vapor-liquid dome.
    pub(crate) fn resolve_two_phase(eos: &E, t: f64, rho: f64) -> MeosResult<Self> {
        if t < eos.critical_constants().temperature {
            let vle = PhaseEquilibrium::pure_t(eos, t * KELVIN, None, SolverOptions::default())?;
            let (rho_l, rho_v) = (vle.liquid().rho, vle.vapor().rho);
            if rho > rho_v && rho < rho_l {
                let quality = (1.0 / rho - 1.0 / rho_l) / (1.0 / rho_v - 1.0 / rho_l);
                return Ok(Self::from_two_phase(vle, quality));
            }
        }
        Ok(Self::new_unchecked(eos, t, rho))
    }

    pub(crate) fn new_unchecked(eos: &E, t: f64, rho: f64) -> Self {
        Self {
            eos: eos.clone(),
            temperature: t * KELVIN,
            density: rho * MOL / (METER * METER * METER),
            molar_volume: rho.recip() * METER * METER * METER / MOL,
            t,
            rho,
            phase: OnceLock::new(),
            two_phase: None,
            cache: Cache::new(),
        }
    }

    /// Mark the phase of the state explicitly.
    pub(crate) fn with_phase(self, phase: Phase) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(phase);
        Self {
            phase: cell,
            ..self
        }
    }

    /// Combine a phase equilibrium into a state with the given vapor quality.
    ///
    /// Qualities of exactly 0 or 1 return the saturated liquid or vapor.
    pub(crate) fn from_two_phase(vle: PhaseEquilibrium<E, 2>, quality: f64) -> Self {
        if quality <= 0.0 {
            return vle.liquid().clone();
        }
        if quality >= 1.0 {
            return vle.vapor().clone();
        }
        let v = (1.0 - quality) / vle.liquid().rho + quality / vle.vapor().rho;
        let state = Self::new_unchecked(&vle.vapor().eos, vle.vapor().t, v.recip());
        Self {
            two_phase: Some(Box::new(TwoPhaseState { quality, vle })),
            ..state.with_phase(Phase::TwoPhase)
        }
    }

    /// Phase of the state.
    pub fn phase(&self) -> Phase {
        *self.phase.get_or_init(|| {
            if self.t >= self.eos.critical_constants().temperature {
                Phase::Supercritical
            } else if self.phase_identification_parameter() > 1.0 {
                Phase::Liquid
            } else {
                Phase::Vapor
            }
        })
    }

    /// Vapor quality and coexisting phases if the state is two-phase.
    pub fn two_phase(&self) -> Option<&TwoPhaseState<E>> {
        self.two_phase.as_deref()
    }

    /// Molar vapor fraction if the state is two-phase.
    pub fn vapor_quality(&self) -> Option<f64> {
        self.two_phase().map(|tp| tp.quality)
    }

    /// Temperature in K.
    pub(crate) fn t(&self) -> f64 {
        self.t
    }

    /// Molar density in mol/m³.
    pub(crate) fn rho(&self) -> f64 {
        self.rho
    }
}

/// Validate the given temperature and density.
///
/// Properties are valid if
/// * they are finite
/// * they have a positive sign
pub(crate) fn validate(temperature: f64, density: f64) -> MeosResult<()> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(MeosError::InvalidState(
            String::from("validate"),
            String::from("temperature"),
            temperature,
        ));
    }
    if !density.is_finite() || density <= 0.0 {
        return Err(MeosError::InvalidState(
            String::from("validate"),
            String::from("density"),
            density,
        ));
    }
    Ok(())
}
