use typenum::P3;
use super::{ethane, propane, records};
use approx::assert_relative_eq;
use meos::transport::dilute::{LennardJones, eucken};
use meos::transport::{OlchowySengers, ThermalConductivityCorrelation, ViscosityCorrelation};
use meos::{MultiParameter, MultiParameterOptions};
use meos_core::parameter::{Identifier, IdentifierOption};
use meos_core::{
    Contributions, HelmholtzEnergyDyn, MeosError, MeosResult, PhaseEquilibrium, SolverOptions,
    State, Transport,
};
use quantity::*;
use std::sync::Arc;

const ETHANE_LJ: LennardJones = LennardJones {
    sigma: 4.443,
    epsilon_k: 215.7,
};

#[test]
fn state_transport_properties() -> MeosResult<()> {
    let eos = ethane()?;
    let state = State::new_tp(&eos, 300.0 * KELVIN, 50.0 * BAR, None)?;
    let eta = state.viscosity()?.convert_into(PASCAL * SECOND);
    let lambda = state
        .thermal_conductivity()?
        .convert_into(WATT / (METER * KELVIN));
    assert!(eta > 0.0 && lambda > 0.0);

    let rho_m = state.mass_density().convert_into(KILOGRAM / METER.powi::<P3>());
    let cp = state
        .specific_isobaric_heat_capacity(Contributions::Total)
        .convert_into(JOULE / (KILOGRAM * KELVIN));
    assert_relative_eq!(
        state
            .kinematic_viscosity()?
            .convert_into(METER * METER / SECOND),
        eta / rho_m,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        state
            .thermal_diffusivity()?
            .convert_into(METER * METER / SECOND),
        lambda / (rho_m * cp),
        max_relative = 1e-10
    );
    assert_relative_eq!(state.prandtl_number()?, cp * eta / lambda, max_relative = 1e-10);
    Ok(())
}

#[test]
fn liquid_and_vapor() -> MeosResult<()> {
    for eos in [ethane()?, propane()?] {
        let vle = PhaseEquilibrium::pure(&eos, 250.0 * KELVIN, None, SolverOptions::default())?;
        assert!(vle.liquid().viscosity()? > vle.vapor().viscosity()?);
        assert!(vle.liquid().thermal_conductivity()? > vle.vapor().thermal_conductivity()?);
    }
    Ok(())
}

#[test]
fn dilute_gas() -> MeosResult<()> {
    let eos = ethane()?;
    let t = 300.0;
    let state = State::new_pure(&eos, t * KELVIN, 1e-6 * MOL / METER.powi::<P3>())?;
    let molar_weight = eos.molar_weight();
    let eta0 = ETHANE_LJ.viscosity(molar_weight, t);
    assert_relative_eq!(eta0, 9.46e-6, max_relative = 5e-3);
    assert_relative_eq!(
        state.viscosity()?.convert_into(PASCAL * SECOND),
        eta0,
        max_relative = 5e-2
    );

    let cp0 = state
        .molar_isobaric_heat_capacity(Contributions::IdealGas)
        .convert_into(JOULE / (MOL * KELVIN));
    let lambda0 = eucken(eta0, molar_weight, cp0, eos.gas_constant(), 1.32);
    assert_relative_eq!(
        state
            .thermal_conductivity()?
            .convert_into(WATT / (METER * KELVIN)),
        lambda0,
        max_relative = 1e-6
    );
    Ok(())
}

#[test]
fn critical_enhancement() -> MeosResult<()> {
    let eos = ethane()?;
    let enhancement = OlchowySengers::default();
    let critical = eos.critical_constants();
    let t_ref = 1.5 * critical.temperature;
    let rho = critical.density;
    assert_eq!(enhancement.evaluate(&eos, t_ref, rho, 2e-5)?, 0.0);
    let near_critical = enhancement.evaluate(&eos, 310.0, rho, 2e-5)?;
    let far = enhancement.evaluate(&eos, 400.0, rho, 2e-5)?;
    assert!(near_critical > far && far > 0.0);
    Ok(())
}

#[test]
fn surface_tension() -> MeosResult<()> {
    let eos = ethane()?;
    assert_relative_eq!(
        eos.surface_tension(184.57 * KELVIN)?,
        0.016191668 * NEWTON / METER,
        max_relative = 1e-8
    );
    let vle = PhaseEquilibrium::pure(&eos, 184.57 * KELVIN, None, SolverOptions::default())?;
    assert_relative_eq!(vle.surface_tension()?, eos.surface_tension(184.57 * KELVIN)?);

    let eos = propane()?;
    assert_relative_eq!(
        eos.surface_tension(231.036 * KELVIN)?,
        0.015666241 * NEWTON / METER,
        max_relative = 1e-8
    );
    let state = State::new_tp(&eos, 380.0 * KELVIN, 10.0 * BAR, None)?;
    assert!(matches!(
        state.surface_tension(),
        Err(MeosError::PropertyUnavailable(_))
    ));
    Ok(())
}

/// Ethane mapped onto itself with the default shape factors.
fn ethane_ecs(critical_enhancement: bool) -> MeosResult<Arc<MultiParameter>> {
    let mut records = records()?;
    let mut record = records[0].clone();
    record.identifier = Identifier::from_name("ethane-ecs");
    record.model_record.viscosity = Some(ViscosityCorrelation::Ecs);
    record.model_record.thermal_conductivity = Some(ThermalConductivityCorrelation::Ecs);
    let json = if critical_enhancement {
        r#"{
            "reference_fluid": "ethane",
            "shape_factors": {"type": "polynomial"},
            "critical_enhancement": {}
        }"#
    } else {
        r#"{"reference_fluid": "ethane", "shape_factors": {"type": "polynomial"}}"#
    };
    record.model_record.ecs = Some(serde_json::from_str(json).map_err(MeosError::from)?);
    records.push(record);
    Ok(Arc::new(MultiParameter::from_records(
        "ethane-ecs",
        &records,
        IdentifierOption::Name,
        &MultiParameterOptions::default(),
    )?))
}

#[test]
fn ecs_identity_mapping() -> MeosResult<()> {
    let eos = ethane()?;
    let mapped = ethane_ecs(true)?;
    for (t, p) in [(250.0, 50.0), (300.0, 10.0), (320.0, 60.0)] {
        let a = State::new_tp(&eos, t * KELVIN, p * BAR, None)?;
        let b = State::new_tp(&mapped, t * KELVIN, p * BAR, None)?;
        assert_relative_eq!(a.viscosity()?, b.viscosity()?, max_relative = 1e-12);
        assert_relative_eq!(
            a.thermal_conductivity()?,
            b.thermal_conductivity()?,
            max_relative = 1e-12
        );
    }
    let ecs = mapped.ecs().unwrap();
    let conformal = ecs.conformal_state(&mapped, 250.0, 14000.0)?;
    assert_eq!((conformal.f, conformal.h), (1.0, 1.0));
    Ok(())
}

#[test]
fn ecs_without_critical_enhancement() -> MeosResult<()> {
    let eos = ethane()?;
    let mapped = ethane_ecs(false)?;
    let unit = WATT / (METER * KELVIN);
    for (t, p) in [(310.0, 55.0), (320.0, 60.0)] {
        let a = State::new_tp(&eos, t * KELVIN, p * BAR, None)?;
        let b = State::new_tp(&mapped, t * KELVIN, p * BAR, None)?;
        assert_relative_eq!(a.viscosity()?, b.viscosity()?, max_relative = 1e-12);

        // the enhancement of the reference fluid is not carried over
        let enhancement = OlchowySengers::default().evaluate(
            &eos,
            t,
            a.density.convert_into(MOL / METER.powi::<P3>()),
            a.viscosity()?.convert_into(PASCAL * SECOND),
        )?;
        assert!(enhancement > 0.0);
        let lambda_a = a.thermal_conductivity()?.convert_into(unit);
        let lambda_b = b.thermal_conductivity()?.convert_into(unit);
        assert_relative_eq!(lambda_a - lambda_b, enhancement, max_relative = 1e-8);
    }
    Ok(())
}

#[test]
fn conformal_states() -> MeosResult<()> {
    let eos = propane()?;
    let ecs = eos.ecs().unwrap();
    let reference = ecs.reference_fluid();
    assert_eq!(reference.name(), "ethane");
    for (t, rho, f, h) in [
        (250.0, 12800.0, 1.23598, 1.36581),
        (300.0, 11000.0, 1.22638, 1.36855),
        (400.0, 3000.0, 1.20701, 1.38981),
    ] {
        let conformal = ecs.conformal_state(&eos, t, rho)?;
        assert_relative_eq!(conformal.f, f, max_relative = 1e-4);
        assert_relative_eq!(conformal.h, h, max_relative = 1e-4);

        // equal residual Helmholtz energy and compressibility factor
        let target = State::new_pure(&eos, t * KELVIN, rho * MOL / METER.powi::<P3>())?;
        let mapped = State::new_pure(
            reference,
            conformal.temperature * KELVIN,
            conformal.density * MOL / METER.powi::<P3>(),
        )?;
        let r = eos.gas_constant();
        assert_relative_eq!(
            target
                .molar_helmholtz_energy(Contributions::Residual)
                .convert_into(JOULE / MOL)
                / (r * t),
            mapped
                .molar_helmholtz_energy(Contributions::Residual)
                .convert_into(JOULE / MOL)
                / (r * conformal.temperature),
            max_relative = 1e-9
        );
        assert_relative_eq!(
            target.compressibility(Contributions::Total),
            mapped.compressibility(Contributions::Total),
            max_relative = 1e-9
        );
    }
    Ok(())
}

#[test]
fn ecs_dilute_gas() -> MeosResult<()> {
    let eos = propane()?;
    let lj = eos.ecs().unwrap().lennard_jones().unwrap();
    let t = 350.0;
    let state = State::new_tp(&eos, t * KELVIN, 2.0 * BAR, None)?;
    let eta = state.viscosity()?.convert_into(PASCAL * SECOND);
    let eta0 = lj.viscosity(eos.molar_weight(), t);
    // the residual part of a low pressure gas is small
    assert!(eta > eta0);
    assert_relative_eq!(eta, eta0, max_relative = 0.1);
    Ok(())
}

#[test]
fn missing_reference_correlations() -> MeosResult<()> {
    let mut records = records()?;
    records[0].model_record.viscosity = None;
    let eos = Arc::new(MultiParameter::from_records(
        "propane",
        &records,
        IdentifierOption::Name,
        &MultiParameterOptions::default(),
    )?);
    let state = State::new_tp(&eos, 300.0 * KELVIN, 50.0 * BAR, None)?;
    assert!(matches!(
        state.viscosity(),
        Err(MeosError::PropertyUnavailable(_))
    ));
    // the critical enhancement of the target needs its viscosity
    assert!(matches!(
        state.thermal_conductivity(),
        Err(MeosError::PropertyUnavailable(_))
    ));
    Ok(())
}
