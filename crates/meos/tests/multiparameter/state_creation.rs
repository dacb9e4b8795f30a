use typenum::P3;
use super::ethane;
use approx::assert_relative_eq;
use meos_core::DensityInitialization::{Liquid, Vapor};
use meos_core::{
    Contributions, HelmholtzEnergyDyn, MeosError, MeosResult, Phase, State, StateBuilder,
};
use quantity::*;

#[test]
fn temperature_pressure() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 250.0 * KELVIN;
    let p = 8.0 * BAR;
    let vapor = State::new_tp(&eos, t, p, None)?;
    assert_relative_eq!(vapor.pressure(Contributions::Total), p, max_relative = 1e-8);
    assert_eq!(vapor.phase(), Phase::Vapor);

    let p = 50.0 * BAR;
    let liquid = State::new_tp(&eos, t, p, Some(Liquid))?;
    assert_relative_eq!(liquid.pressure(Contributions::Total), p, max_relative = 1e-8);
    assert_eq!(liquid.phase(), Phase::Liquid);
    assert!(liquid.density > 10.0 * vapor.density);
    Ok(())
}

#[test]
fn temperature_caloric() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 250.0 * KELVIN;
    for (p, init) in [(8.0 * BAR, Vapor), (50.0 * BAR, Liquid)] {
        let state = State::new_tp(&eos, t, p, Some(init))?;
        let h = state.molar_enthalpy(Contributions::Total);
        let s = state.molar_entropy(Contributions::Total);
        let u = state.molar_internal_energy(Contributions::Total);
        let th = State::new_th(&eos, t, h, Some(init))?;
        assert_relative_eq!(th.density, state.density, max_relative = 1e-7);
        let ts = State::new_ts(&eos, t, s, Some(init))?;
        assert_relative_eq!(ts.density, state.density, max_relative = 1e-7);
        let tu = State::new_tu(&eos, t, u, Some(init))?;
        assert_relative_eq!(tu.density, state.density, max_relative = 1e-7);
    }
    Ok(())
}

#[test]
fn pressure_inputs() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 250.0 * KELVIN;
    for (p, init) in [(8.0 * BAR, Vapor), (50.0 * BAR, Liquid)] {
        let state = State::new_tp(&eos, t, p, Some(init))?;
        let prho = State::new_prho(&eos, p, state.density)?;
        assert_relative_eq!(prho.temperature, t, max_relative = 1e-8);

        let h = state.molar_enthalpy(Contributions::Total);
        let ph = State::new_ph(&eos, p, h, None)?;
        assert_relative_eq!(ph.temperature, t, max_relative = 1e-7);
        assert_relative_eq!(ph.density, state.density, max_relative = 1e-7);

        let s = state.molar_entropy(Contributions::Total);
        let ps = State::new_ps(&eos, p, s, None)?;
        assert_relative_eq!(ps.temperature, t, max_relative = 1e-7);

        let u = state.molar_internal_energy(Contributions::Total);
        let pu = State::new_pu(&eos, p, u, None)?;
        assert_relative_eq!(pu.temperature, t, max_relative = 1e-7);
    }
    Ok(())
}

#[test]
fn density_inputs() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 320.0 * KELVIN;
    let state = State::new_tp(&eos, t, 30.0 * BAR, None)?;
    let rho = state.density;

    let h = state.molar_enthalpy(Contributions::Total);
    assert_relative_eq!(
        State::new_rhoh(&eos, rho, h, None)?.temperature,
        t,
        max_relative = 1e-7
    );
    let s = state.molar_entropy(Contributions::Total);
    assert_relative_eq!(
        State::new_rhos(&eos, rho, s, None)?.temperature,
        t,
        max_relative = 1e-7
    );
    let u = state.molar_internal_energy(Contributions::Total);
    assert_relative_eq!(
        State::new_rhou(&eos, rho, u, None)?.temperature,
        t,
        max_relative = 1e-7
    );
    Ok(())
}

#[test]
fn enthalpy_entropy() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 350.0 * KELVIN;
    let state = State::new_tp(&eos, t, 30.0 * BAR, None)?;
    let hs = State::new_hs(
        &eos,
        state.molar_enthalpy(Contributions::Total),
        state.molar_entropy(Contributions::Total),
        Some(340.0 * KELVIN),
        Some(Vapor),
    )?;
    assert_relative_eq!(hs.temperature, t, max_relative = 1e-6);
    assert_relative_eq!(hs.density, state.density, max_relative = 1e-6);
    Ok(())
}

#[test]
fn two_phase_states() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 250.0 * KELVIN;
    let state = State::new_tx(&eos, t, 0.3)?;
    assert_eq!(state.phase(), Phase::TwoPhase);
    assert_relative_eq!(state.vapor_quality().unwrap_or(f64::NAN), 0.3, max_relative = 1e-10);

    // the lever rule applies to all extensive properties
    let vle = &state.two_phase().unwrap().vle;
    let h = state.molar_enthalpy(Contributions::Total);
    let h_l = vle.liquid().molar_enthalpy(Contributions::Total);
    let h_v = vle.vapor().molar_enthalpy(Contributions::Total);
    assert_relative_eq!(h, 0.7 * h_l + 0.3 * h_v, max_relative = 1e-10);
    assert!(
        state
            .molar_isobaric_heat_capacity(Contributions::Total)
            .convert_into(JOULE / (MOL * KELVIN))
            .is_nan()
    );

    let trho = State::new_trho(&eos, t, state.density)?;
    assert_relative_eq!(trho.vapor_quality().unwrap_or(f64::NAN), 0.3, max_relative = 1e-8);

    let p = state.pressure(Contributions::Total);
    let ph = State::new_ph(&eos, p, h, None)?;
    assert_relative_eq!(ph.vapor_quality().unwrap_or(f64::NAN), 0.3, max_relative = 1e-6);
    assert_relative_eq!(ph.temperature, t, max_relative = 1e-8);

    let px = State::new_px(&eos, p, 0.3)?;
    assert_relative_eq!(px.temperature, t, max_relative = 1e-8);

    // transport properties are not defined for two-phase states
    assert!(matches!(
        state.viscosity(),
        Err(MeosError::PropertyUnavailable(_))
    ));
    Ok(())
}

#[test]
fn builder() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 250.0 * KELVIN;
    let p = 8.0 * BAR;
    let state = StateBuilder::new(&eos).temperature(t).pressure(p).build()?;
    let h = state.molar_enthalpy(Contributions::Total);
    let ph = StateBuilder::new(&eos)
        .pressure(p)
        .molar_enthalpy(h)
        .build()?;
    assert_relative_eq!(ph.temperature, t, max_relative = 1e-7);
    assert!(matches!(
        StateBuilder::new(&eos).temperature(t).build(),
        Err(MeosError::UndeterminedState(_))
    ));
    Ok(())
}

#[test]
fn out_of_range() -> MeosResult<()> {
    let eos = ethane()?;
    assert!(matches!(
        State::new_tp(&eos, 80.0 * KELVIN, BAR, None),
        Err(MeosError::OutOfRange { .. })
    ));
    assert!(matches!(
        State::new_tp(&eos, 300.0 * KELVIN, 2e8 * PASCAL, None),
        Err(MeosError::OutOfRange { .. })
    ));
    assert!(matches!(
        State::new_tx(&eos, 250.0 * KELVIN, 1.5),
        Err(MeosError::OutOfRange { .. })
    ));
    assert!(State::new_pure(&eos, -1.0 * KELVIN, MOL / METER.powi::<P3>()).is_err());
    Ok(())
}

#[test]
fn unreachable_targets() -> MeosResult<()> {
    let eos = ethane()?;
    let c = Contributions::Total;
    let kj = 1e3 * JOULE / MOL;

    // the dilute isochore stays far below 900 bar up to the maximum temperature
    let rho = MOL / METER.powi::<P3>();
    assert!(matches!(
        State::new_prho(&eos, 900.0 * BAR, rho),
        Err(MeosError::OutOfRange { .. })
    ));

    // more energy than the isochore holds at the maximum temperature
    let rho = 100.0 * MOL / METER.powi::<P3>();
    let hot = State::new_pure(&eos, 740.0 * KELVIN, rho)?;
    let h = hot.molar_enthalpy(c) + 50.0 * kj;
    assert!(matches!(
        State::new_rhoh(&eos, rho, h, None),
        Err(MeosError::OutOfRange { .. })
    ));
    let u = hot.molar_internal_energy(c) + 50.0 * kj;
    assert!(matches!(
        State::new_rhou(&eos, rho, u, Some(300.0 * KELVIN)),
        Err(MeosError::OutOfRange { .. })
    ));

    // more than the ideal gas enthalpy on the isotherm
    let t = 250.0 * KELVIN;
    let gas = State::new_tp(&eos, t, BAR, None)?;
    let h = gas.molar_enthalpy(c) + 20.0 * kj;
    assert!(matches!(
        State::new_th(&eos, t, h, None),
        Err(MeosError::UndeterminedState(_))
    ));
    let u = gas.molar_internal_energy(c) + 20.0 * kj;
    assert!(matches!(
        State::new_tu(&eos, t, u, Some(Vapor)),
        Err(MeosError::UndeterminedState(_))
    ));

    // more than the isobar holds at the maximum temperature
    let p = 10.0 * BAR;
    let h = State::new_tp(&eos, 740.0 * KELVIN, p, None)?.molar_enthalpy(c) + 50.0 * kj;
    assert!(matches!(
        State::new_ph(&eos, p, h, None),
        Err(MeosError::OutOfRange { .. })
    ));
    Ok(())
}

#[test]
fn temperature_density_round_trip() -> MeosResult<()> {
    let eos = ethane()?;
    let p_max = eos.limits().p_max;
    let mut single_phase = 0;
    for t in [100.0, 150.0, 200.0, 250.0, 300.0, 306.0, 350.0, 500.0, 700.0] {
        for rho in [1.0, 10.0, 100.0, 1000.0, 3000.0, 6500.0, 10000.0, 15000.0, 20000.0] {
            let state = State::new_trho(&eos, t * KELVIN, rho * MOL / METER.powi::<P3>())?;
            let p = state.pressure(Contributions::Total);
            if state.two_phase().is_some() || p.convert_into(PASCAL) > p_max {
                continue;
            }
            let tp = State::new_tp(&eos, t * KELVIN, p, None)?;
            assert_relative_eq!(tp.density, state.density, max_relative = 1e-7);
            let prho = State::new_prho(&eos, p, state.density)?;
            assert_relative_eq!(prho.temperature, state.temperature, max_relative = 1e-7);
            single_phase += 1;
        }
    }
    assert!(single_phase > 30);
    Ok(())
}

#[test]
fn near_critical_states() -> MeosResult<()> {
    let eos = ethane()?;
    let c = Contributions::Total;
    let cc = eos.critical_constants();
    let rho = cc.density * MOL / METER.powi::<P3>();

    let state = State::new_trho(&eos, (cc.temperature - 0.1) * KELVIN, rho)?;
    assert_eq!(state.phase(), Phase::TwoPhase);
    let quality = state.vapor_quality().unwrap_or(f64::NAN);
    assert!(quality > 0.0 && quality < 1.0);

    let t = (cc.temperature + 0.2) * KELVIN;
    let state = State::new_trho(&eos, t, rho)?;
    assert!(state.two_phase().is_none());
    let p = state.pressure(c);
    assert!(p > cc.pressure * PASCAL);
    let tp = State::new_tp(&eos, t, p, None)?;
    assert_relative_eq!(tp.density, rho, max_relative = 1e-6);
    let ph = State::new_ph(&eos, p, state.molar_enthalpy(c), None)?;
    assert_relative_eq!(ph.temperature, t, max_relative = 1e-7);
    assert_relative_eq!(ph.density, rho, max_relative = 1e-5);
    Ok(())
}
