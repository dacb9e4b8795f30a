use typenum::P3;
use super::{ethane, fluid};
use approx::assert_relative_eq;
use meos::{MultiParameter, MultiParameterOptions, ReferenceState};
use meos_core::{Contributions, MeosResult, PhaseEquilibrium, SolverOptions, State};
use quantity::*;
use std::sync::Arc;

fn ethane_with(reference_state: ReferenceState) -> MeosResult<Arc<MultiParameter>> {
    fluid(
        "ethane",
        &MultiParameterOptions::new().reference_state(reference_state),
    )
}

fn saturated_liquid_at(eos: &Arc<MultiParameter>, t: f64) -> MeosResult<(f64, f64)> {
    let vle = PhaseEquilibrium::pure(eos, t * KELVIN, None, SolverOptions::default())?;
    let liquid = vle.liquid();
    Ok((
        liquid
            .specific_enthalpy(Contributions::Total)
            .convert_into(JOULE / KILOGRAM),
        liquid
            .specific_entropy(Contributions::Total)
            .convert_into(JOULE / (KILOGRAM * KELVIN)),
    ))
}

#[test]
fn normal_boiling_point() -> MeosResult<()> {
    let eos = ethane_with(ReferenceState::Nbp)?;
    let vle = PhaseEquilibrium::pure(&eos, 101325.0 * PASCAL, None, SolverOptions::default())?;
    let liquid = vle.liquid();
    assert_relative_eq!(
        liquid
            .molar_enthalpy(Contributions::Total)
            .convert_into(JOULE / MOL),
        0.0,
        epsilon = 1e-5
    );
    assert_relative_eq!(
        liquid
            .molar_entropy(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN)),
        0.0,
        epsilon = 1e-7
    );
    assert!(vle.vapor().molar_enthalpy(Contributions::Total) > 0.0 * JOULE / MOL);
    Ok(())
}

#[test]
fn iir_and_ashrae() -> MeosResult<()> {
    let eos = ethane_with(ReferenceState::Iir)?;
    let (h, s) = saturated_liquid_at(&eos, 273.15)?;
    assert_relative_eq!(h, 200e3, max_relative = 1e-9);
    assert_relative_eq!(s, 1e3, max_relative = 1e-9);

    let eos = ethane_with(ReferenceState::Ashrae)?;
    let (h, s) = saturated_liquid_at(&eos, 233.15)?;
    assert_relative_eq!(h, 0.0, epsilon = 1e-4);
    assert_relative_eq!(s, 0.0, epsilon = 1e-7);
    Ok(())
}

#[test]
fn oto_and_custom() -> MeosResult<()> {
    let eos = ethane_with(ReferenceState::Oto)?;
    let state = State::new_tp(&eos, 298.15 * KELVIN, 101325.0 * PASCAL, None)?;
    assert_relative_eq!(
        state
            .molar_enthalpy(Contributions::Total)
            .convert_into(JOULE / MOL),
        0.0,
        epsilon = 1e-6
    );

    let (t, p) = (300.0 * KELVIN, 10.0 * BAR);
    let (h, s) = (1000.0 * JOULE / MOL, 10.0 * JOULE / (MOL * KELVIN));
    let eos = ethane_with(ReferenceState::Custom {
        temperature: t,
        pressure: p,
        molar_enthalpy: h,
        molar_entropy: s,
    })?;
    let state = State::new_tp(&eos, t, p, None)?;
    assert_relative_eq!(
        state.molar_enthalpy(Contributions::Total),
        h,
        max_relative = 1e-9
    );
    assert_relative_eq!(
        state.molar_entropy(Contributions::Total),
        s,
        max_relative = 1e-9
    );
    Ok(())
}

#[test]
fn only_energies_and_entropies_change() -> MeosResult<()> {
    let reference = ethane()?;
    let shifted = ethane_with(ReferenceState::Iir)?;
    let t = 250.0 * KELVIN;
    let rho = 14000.0 * MOL / METER.powi::<P3>();
    let a = State::new_pure(&reference, t, rho)?;
    let b = State::new_pure(&shifted, t, rho)?;
    assert_relative_eq!(
        a.pressure(Contributions::Total),
        b.pressure(Contributions::Total),
        max_relative = 1e-14
    );
    assert_relative_eq!(
        a.molar_isobaric_heat_capacity(Contributions::Total),
        b.molar_isobaric_heat_capacity(Contributions::Total),
        max_relative = 1e-12
    );
    assert_relative_eq!(a.speed_of_sound(), b.speed_of_sound(), max_relative = 1e-12);

    let vapor = |eos: &Arc<MultiParameter>| State::new_pure(eos, t, 100.0 * MOL / METER.powi::<P3>());
    let dh_a = vapor(&reference)?.molar_enthalpy(Contributions::Total)
        - a.molar_enthalpy(Contributions::Total);
    let dh_b = vapor(&shifted)?.molar_enthalpy(Contributions::Total)
        - b.molar_enthalpy(Contributions::Total);
    assert_relative_eq!(dh_a, dh_b, max_relative = 1e-9);
    Ok(())
}
