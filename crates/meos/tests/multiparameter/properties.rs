use typenum::P3;
use super::{ethane, propane};
use approx::assert_relative_eq;
use meos_core::{Contributions, HelmholtzEnergyDyn, MeosResult, State};
use quantity::*;

#[test]
fn ideal_gas_limit() -> MeosResult<()> {
    let eos = ethane()?;
    let state = State::new_pure(&eos, 300.0 * KELVIN, 1e-3 * MOL / METER.powi::<P3>())?;
    assert_relative_eq!(
        state.compressibility(Contributions::Total),
        1.0,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        state.molar_isobaric_heat_capacity(Contributions::Total),
        52.698 * JOULE / (MOL * KELVIN),
        max_relative = 1e-4
    );
    Ok(())
}

#[test]
fn thermodynamic_consistency() -> MeosResult<()> {
    let eos = propane()?;
    for (t, rho) in [(250.0, 13000.0), (300.0, 500.0), (400.0, 6000.0)] {
        let state = State::new_pure(&eos, t * KELVIN, rho * MOL / METER.powi::<P3>())?;
        let p = state.pressure(Contributions::Total).convert_into(PASCAL);
        let h = state
            .molar_enthalpy(Contributions::Total)
            .convert_into(JOULE / MOL);
        let u = state
            .molar_internal_energy(Contributions::Total)
            .convert_into(JOULE / MOL);
        let s = state
            .molar_entropy(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN));
        let g = state
            .molar_gibbs_energy(Contributions::Total)
            .convert_into(JOULE / MOL);
        assert_relative_eq!(h, u + p / rho, max_relative = 1e-10, epsilon = 1e-8);
        assert_relative_eq!(g, h - t * s, max_relative = 1e-10, epsilon = 1e-8);

        let cp = state
            .molar_isobaric_heat_capacity(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN));
        let cv = state
            .molar_isochoric_heat_capacity(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN));
        let dp_dt = state
            .dp_dt(Contributions::Total)
            .convert_into(PASCAL / KELVIN);
        let dp_drho = state
            .dp_drho(Contributions::Total)
            .convert_into(PASCAL / (MOL / METER.powi::<P3>()));
        assert_relative_eq!(
            cp - cv,
            t * dp_dt.powi(2) / (rho * rho * dp_drho),
            max_relative = 1e-10
        );

        let w = state.speed_of_sound().convert_into(METER / SECOND);
        assert_relative_eq!(
            w * w,
            cp / cv * dp_drho / eos.molar_weight(),
            max_relative = 1e-10
        );

        // finite differences along the isochore
        let dt = 1e-4;
        let s_plus = State::new_pure(&eos, (t + dt) * KELVIN, state.density)?
            .molar_entropy(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN));
        let s_minus = State::new_pure(&eos, (t - dt) * KELVIN, state.density)?
            .molar_entropy(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN));
        assert_relative_eq!(
            (s_plus - s_minus) / (2.0 * dt),
            cv / t,
            max_relative = 1e-6
        );
    }
    Ok(())
}

#[test]
fn contributions() -> MeosResult<()> {
    let eos = ethane()?;
    let state = State::new_pure(&eos, 250.0 * KELVIN, 14000.0 * MOL / METER.powi::<P3>())?;
    for (total, ideal_gas, residual) in [
        (
            state.molar_enthalpy(Contributions::Total),
            state.molar_enthalpy(Contributions::IdealGas),
            state.molar_enthalpy(Contributions::Residual),
        ),
        (
            state.molar_helmholtz_energy(Contributions::Total),
            state.molar_helmholtz_energy(Contributions::IdealGas),
            state.molar_helmholtz_energy(Contributions::Residual),
        ),
    ] {
        assert_relative_eq!(total, ideal_gas + residual, max_relative = 1e-12);
    }
    assert_relative_eq!(
        state.pressure(Contributions::IdealGas),
        250.0 * 14000.0 * eos.gas_constant() * PASCAL,
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn second_virial_coefficient() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 300.0 * KELVIN;
    let rho = 1e-2;
    let state = State::new_pure(&eos, t, rho * MOL / METER.powi::<P3>())?;
    let b = state
        .second_virial_coefficient()
        .convert_into(METER.powi::<P3>() / MOL);
    assert!(b < 0.0);
    assert_relative_eq!(
        (state.compressibility(Contributions::Total) - 1.0) / rho,
        b,
        max_relative = 1e-4
    );
    Ok(())
}
