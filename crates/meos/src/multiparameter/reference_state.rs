use super::MultiParameter;
use super::ideal_gas_function::IdealGasFunction;
use meos_core::{
    Contributions, HelmholtzEnergyDyn, MeosResult, PhaseEquilibrium, SolverOptions, State,
};
use quantity::{
    JOULE, KELVIN, MOL, MolarEnergy, MolarEntropy, PASCAL, Pressure, Temperature,
};

const ATMOSPHERE: f64 = 101325.0;

/// Zero point of enthalpy and entropy.
///
/// Reference states other than [ReferenceState::Equation] shift the ideal
/// gas part of the equation by $a_1+a_2\tau$, which leaves all properties
/// except energies and entropies unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub enum ReferenceState {
    /// Reference state of the published equation.
    #[default]
    Equation,
    /// $h=0$ and $s=0$ for the saturated liquid at the normal boiling point.
    Nbp,
    /// $h=200$ kJ/kg and $s=1$ kJ/(kg K) for the saturated liquid at 0 °C.
    Iir,
    /// $h=0$ and $s=0$ for the saturated liquid at -40 °C.
    Ashrae,
    /// $h=0$ and $s=0$ at 25 °C and 1 atm.
    Oto,
    /// Given enthalpy and entropy at the given temperature and pressure.
    Custom {
        temperature: Temperature,
        pressure: Pressure,
        molar_enthalpy: MolarEnergy,
        molar_entropy: MolarEntropy,
    },
}

impl ReferenceState {
    /// Offset term for an equation that uses the reference state of its publication.
    pub(super) fn offset(&self, eos: &MultiParameter) -> MeosResult<Option<IdealGasFunction>> {
        let molar_weight = eos.molar_weight();
        let saturated_liquid_t = |t: f64| -> MeosResult<_> {
            let vle =
                PhaseEquilibrium::pure(&eos, t * KELVIN, None, SolverOptions::default())?;
            Ok(enthalpy_entropy(vle.liquid()))
        };
        let ((h0, s0), h, s) = match *self {
            Self::Equation => return Ok(None),
            Self::Nbp => {
                let vle = PhaseEquilibrium::pure(
                    &eos,
                    ATMOSPHERE * PASCAL,
                    None,
                    SolverOptions::default(),
                )?;
                (enthalpy_entropy(vle.liquid()), 0.0, 0.0)
            }
            Self::Iir => (
                saturated_liquid_t(273.15)?,
                200e3 * molar_weight,
                1e3 * molar_weight,
            ),
            Self::Ashrae => (saturated_liquid_t(233.15)?, 0.0, 0.0),
            Self::Oto => {
                let state =
                    State::new_tp(&eos, 298.15 * KELVIN, ATMOSPHERE * PASCAL, None)?;
                (enthalpy_entropy(&state), 0.0, 0.0)
            }
            Self::Custom {
                temperature,
                pressure,
                molar_enthalpy,
                molar_entropy,
            } => {
                let state = State::new_tp(&eos, temperature, pressure, None)?;
                (
                    enthalpy_entropy(&state),
                    molar_enthalpy.convert_into(JOULE / MOL),
                    molar_entropy.convert_into(JOULE / (MOL * KELVIN)),
                )
            }
        };
        let r = eos.gas_constant();
        let (t_red, _) = eos.reducing_point();
        Ok(Some(IdealGasFunction::EnthalpyEntropyOffset {
            a1: (s0 - s) / r,
            a2: (h - h0) / (r * t_red),
        }))
    }
}

fn enthalpy_entropy(state: &State<&MultiParameter>) -> (f64, f64) {
    (
        state
            .molar_enthalpy(Contributions::Total)
            .convert_into(JOULE / MOL),
        state
            .molar_entropy(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN)),
    )
}
