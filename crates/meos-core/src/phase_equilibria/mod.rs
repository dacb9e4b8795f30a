use crate::equation_of_state::{HelmholtzEnergy, Transport};
use crate::errors::{MeosError, MeosResult};
use crate::state::{Phase, State};
use quantity::{Pressure, Quantity, SIUnit, SurfaceTension, Temperature};
use typenum::{N1, N2, P1, Z0};
use std::fmt;

mod phase_diagram;
mod vle_pure;
pub use phase_diagram::PhaseDiagram;

/// Trait that enables functions to be generic over their input unit.
pub trait TemperatureOrPressure: Copy {
    const IDENTIFIER: &'static str;

    fn temperature(&self) -> Option<Temperature>;
    fn pressure(&self) -> Option<Pressure>;
}

impl TemperatureOrPressure for Temperature {
    const IDENTIFIER: &'static str = "temperature";

    fn temperature(&self) -> Option<Temperature> {
        Some(*self)
    }

    fn pressure(&self) -> Option<Pressure> {
        None
    }
}

// `Pressure` is spelled out because the alias resolves through a `Diff` projection
// that coherence cannot distinguish from `Temperature`.
impl TemperatureOrPressure for Quantity<f64, SIUnit<N2, N1, P1, Z0, Z0, Z0, Z0>> {
    const IDENTIFIER: &'static str = "pressure";

    fn temperature(&self) -> Option<Temperature> {
        None
    }

    fn pressure(&self) -> Option<Pressure> {
        Some(*self)
    }
}

/// A thermodynamic equilibrium state.
///
/// The struct is parametrized over the number of phases. For pure
/// fluids only the vapor/liquid case is used, with the vapor stored first.
///
/// ## Contents
///
/// + [Pure component phase equilibria](#pure-component-phase-equilibria)
/// + [Utility functions](#utility-functions)
#[derive(Debug, Clone)]
pub struct PhaseEquilibrium<E, const P: usize>(pub [State<E>; P]);

impl<E: HelmholtzEnergy, const P: usize> fmt::Display for PhaseEquilibrium<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.0.iter().enumerate() {
            writeln!(f, "phase {i}: {s}")?;
        }
        Ok(())
    }
}

impl<E> PhaseEquilibrium<E, 2> {
    pub fn vapor(&self) -> &State<E> {
        &self.0[0]
    }

    pub fn liquid(&self) -> &State<E> {
        &self.0[1]
    }
}

const TRIVIAL_REL_DEVIATION: f64 = 1e-5;

/// # Utility functions
impl<E: HelmholtzEnergy> PhaseEquilibrium<E, 2> {
    pub(crate) fn from_states(state1: State<E>, state2: State<E>) -> Self {
        let (vapor, liquid) = if state1.rho() < state2.rho() {
            (state1, state2)
        } else {
            (state2, state1)
        };
        Self([vapor.with_phase(Phase::Vapor), liquid.with_phase(Phase::Liquid)])
    }

    /// The critical point of the equation as a degenerate equilibrium.
    pub(crate) fn critical_point(eos: &E) -> Self {
        let cc = eos.critical_constants();
        let critical = State::new_unchecked(eos, cc.temperature, cc.density)
            .with_phase(Phase::Critical);
        Self([critical.clone(), critical])
    }

    pub(crate) fn check_trivial_solution(self) -> MeosResult<Self> {
        if Self::is_trivial_solution(self.vapor(), self.liquid()) {
            Err(MeosError::TrivialSolution)
        } else {
            Ok(self)
        }
    }

    /// Check if the two states form a trivial solution
    pub fn is_trivial_solution(state1: &State<E>, state2: &State<E>) -> bool {
        (state2.rho() / state1.rho() - 1.0).abs() < TRIVIAL_REL_DEVIATION
    }
}

impl<E: HelmholtzEnergy + Transport> PhaseEquilibrium<E, 2> {
    /// Surface tension of the vapor-liquid interface.
    pub fn surface_tension(&self) -> MeosResult<SurfaceTension> {
        self.vapor().surface_tension()
    }
}
