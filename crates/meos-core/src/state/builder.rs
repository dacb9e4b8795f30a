use super::{DensityInitialization, State};
use crate::equation_of_state::HelmholtzEnergy;
use crate::errors::{MeosError, MeosResult};
use quantity::*;

/// A simple tool to construct [State]s with arbitrary input parameters.
///
/// Exactly two of temperature, pressure, density, molar enthalpy, molar
/// entropy, molar internal energy and vapor quality have to be given.
///
/// # Examples
/// ```no_run
/// # use meos_core::{HelmholtzEnergy, MeosResult, StateBuilder};
/// # use quantity::*;
/// # fn build<E: HelmholtzEnergy>(eos: &E) -> MeosResult<()> {
/// // Saturated liquid at 250 K
/// let state = StateBuilder::new(eos)
///     .temperature(250.0 * KELVIN)
///     .vapor_quality(0.0)
///     .build()?;
///
/// // Liquid phase at given temperature and pressure
/// let state = StateBuilder::new(eos)
///     .temperature(250.0 * KELVIN)
///     .pressure(50.0 * BAR)
///     .liquid()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StateBuilder<'a, E> {
    eos: &'a E,
    temperature: Option<Temperature>,
    pressure: Option<Pressure>,
    density: Option<Density>,
    molar_enthalpy: Option<MolarEnergy>,
    molar_entropy: Option<MolarEntropy>,
    molar_internal_energy: Option<MolarEnergy>,
    vapor_quality: Option<f64>,
    density_initialization: Option<DensityInitialization>,
    initial_temperature: Option<Temperature>,
}

impl<'a, E: HelmholtzEnergy> StateBuilder<'a, E> {
    /// Create a new `StateBuilder` for the given equation of state.
    pub fn new(eos: &'a E) -> Self {
        StateBuilder {
            eos,
            temperature: None,
            pressure: None,
            density: None,
            molar_enthalpy: None,
            molar_entropy: None,
            molar_internal_energy: None,
            vapor_quality: None,
            density_initialization: None,
            initial_temperature: None,
        }
    }

    /// Provide the temperature for the new state.
    pub fn temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Provide the pressure for the new state.
    pub fn pressure(mut self, pressure: Pressure) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Provide the molar density for the new state.
    pub fn density(mut self, density: Density) -> Self {
        self.density = Some(density);
        self
    }

    /// Provide the molar enthalpy for the new state.
    pub fn molar_enthalpy(mut self, molar_enthalpy: MolarEnergy) -> Self {
        self.molar_enthalpy = Some(molar_enthalpy);
        self
    }

    /// Provide the molar entropy for the new state.
    pub fn molar_entropy(mut self, molar_entropy: MolarEntropy) -> Self {
        self.molar_entropy = Some(molar_entropy);
        self
    }

    /// Provide the molar internal energy for the new state.
    pub fn molar_internal_energy(mut self, molar_internal_energy: MolarEnergy) -> Self {
        self.molar_internal_energy = Some(molar_internal_energy);
        self
    }

    /// Provide the vapor quality (molar vapor fraction) for the new state.
    pub fn vapor_quality(mut self, vapor_quality: f64) -> Self {
        self.vapor_quality = Some(vapor_quality);
        self
    }

    /// Specify a vapor state.
    pub fn vapor(mut self) -> Self {
        self.density_initialization = Some(DensityInitialization::Vapor);
        self
    }

    /// Specify a liquid state.
    pub fn liquid(mut self) -> Self {
        self.density_initialization = Some(DensityInitialization::Liquid);
        self
    }

    /// Provide an initial density used in density iterations.
    pub fn initial_density(mut self, initial_density: Density) -> Self {
        self.density_initialization = Some(DensityInitialization::InitialDensity(initial_density));
        self
    }

    /// Provide an initial temperature used in the Newton solver.
    pub fn initial_temperature(mut self, initial_temperature: Temperature) -> Self {
        self.initial_temperature = Some(initial_temperature);
        self
    }

    /// Try to build the state with the given inputs.
    pub fn build(self) -> MeosResult<State<E>> {
        let eos = self.eos;
        let init = self.density_initialization;
        let ti = self.initial_temperature;
        let given = [
            self.temperature.is_some(),
            self.pressure.is_some(),
            self.density.is_some(),
            self.molar_enthalpy.is_some(),
            self.molar_entropy.is_some(),
            self.molar_internal_energy.is_some(),
            self.vapor_quality.is_some(),
        ]
        .into_iter()
        .filter(|&b| b)
        .count();
        if given != 2 {
            return Err(MeosError::UndeterminedState(format!(
                "exactly two state variables are required, {given} were given"
            )));
        }

        match self {
            Self {
                temperature: Some(t),
                density: Some(rho),
                ..
            } => State::new_trho(eos, t, rho),
            Self {
                temperature: Some(t),
                pressure: Some(p),
                ..
            } => State::new_tp(eos, t, p, init),
            Self {
                temperature: Some(t),
                molar_enthalpy: Some(h),
                ..
            } => State::new_th(eos, t, h, init),
            Self {
                temperature: Some(t),
                molar_entropy: Some(s),
                ..
            } => State::new_ts(eos, t, s, init),
            Self {
                temperature: Some(t),
                molar_internal_energy: Some(u),
                ..
            } => State::new_tu(eos, t, u, init),
            Self {
                temperature: Some(t),
                vapor_quality: Some(x),
                ..
            } => State::new_tx(eos, t, x),
            Self {
                pressure: Some(p),
                density: Some(rho),
                ..
            } => State::new_prho(eos, p, rho),
            Self {
                pressure: Some(p),
                molar_enthalpy: Some(h),
                ..
            } => State::new_ph(eos, p, h, ti),
            Self {
                pressure: Some(p),
                molar_entropy: Some(s),
                ..
            } => State::new_ps(eos, p, s, ti),
            Self {
                pressure: Some(p),
                molar_internal_energy: Some(u),
                ..
            } => State::new_pu(eos, p, u, ti),
            Self {
                pressure: Some(p),
                vapor_quality: Some(x),
                ..
            } => State::new_px(eos, p, x),
            Self {
                density: Some(rho),
                molar_enthalpy: Some(h),
                ..
            } => State::new_rhoh(eos, rho, h, ti),
            Self {
                density: Some(rho),
                molar_entropy: Some(s),
                ..
            } => State::new_rhos(eos, rho, s, ti),
            Self {
                density: Some(rho),
                molar_internal_energy: Some(u),
                ..
            } => State::new_rhou(eos, rho, u, ti),
            Self {
                molar_enthalpy: Some(h),
                molar_entropy: Some(s),
                ..
            } => State::new_hs(eos, h, s, ti, init),
            _ => Err(MeosError::UndeterminedState(String::from(
                "unsupported combination of state variables",
            ))),
        }
    }
}
