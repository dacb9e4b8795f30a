use typenum::P3;
use super::{ethane, fluid, records};
use approx::assert_relative_eq;
use meos::multiparameter::ReferenceState;
use meos::{MultiParameter, MultiParameterOptions};
use meos_core::parameter::IdentifierOption;
use meos_core::{Contributions, HelmholtzEnergyDyn, MeosError, MeosResult, State};
use quantity::*;
use std::sync::Arc;

#[test]
fn identifiers() -> MeosResult<()> {
    let records = records()?;
    let options = MultiParameterOptions::default();
    let by_cas = MultiParameter::from_records("74-98-6", &records, IdentifierOption::Cas, &options)?;
    assert_eq!(by_cas.name(), "propane");
    assert_eq!(by_cas.identifier().formula.as_deref(), Some("C3H8"));
    assert_relative_eq!(by_cas.molar_weight(), 0.04409562);
    assert!(matches!(
        fluid("butane", &options),
        Err(MeosError::ComponentsNotFound(_))
    ));
    Ok(())
}

#[test]
fn references() -> MeosResult<()> {
    let eos = ethane()?;
    let references = eos.references();
    assert_eq!(references.len(), 5);
    assert_eq!(
        references[0],
        "Span and Wagner, Int. J. Thermophys. 24 (2003) 41"
    );
    assert!(references.contains(&"Jossi et al., AIChE J. 8 (1962) 59"));
    assert_eq!(eos.equation(), "short");
    assert_relative_eq!(eos.triple_point_temperature(), 90.368 * KELVIN);
    Ok(())
}

#[test]
fn equation_selection() -> MeosResult<()> {
    let mut records = records()?;
    let mut narrow = records[0].model_record.equations[0].clone();
    narrow.name = "narrow".into();
    narrow.t_max = 400.0;
    records[0].model_record.equations.push(narrow);

    let default = MultiParameter::from_records(
        "ethane",
        &records,
        IdentifierOption::Name,
        &MultiParameterOptions::default(),
    )?;
    assert_eq!(default.equation(), "short");
    assert_relative_eq!(default.limits().t_max, 750.0);

    let options = MultiParameterOptions::new().equation("narrow");
    let narrow = Arc::new(MultiParameter::from_records(
        "ethane",
        &records,
        IdentifierOption::Name,
        &options,
    )?);
    assert_eq!(narrow.equation(), "narrow");
    assert!(matches!(
        State::new_tp(&narrow, 500.0 * KELVIN, BAR, None),
        Err(MeosError::OutOfRange { .. })
    ));
    let state = State::new_tp(&narrow, 300.0 * KELVIN, BAR, None)?;
    assert_relative_eq!(
        state.pressure(Contributions::Total),
        BAR,
        max_relative = 1e-10
    );

    let options = MultiParameterOptions::new().equation("reference");
    let error = MultiParameter::from_records("ethane", &records, IdentifierOption::Name, &options)
        .unwrap_err();
    assert!(matches!(error, MeosError::Configuration(_)));
    assert!(error.to_string().contains("narrow"));
    Ok(())
}

#[test]
fn ideal_gas_variants() -> MeosResult<()> {
    let mut records = records()?;
    let mut monatomic = records[0].model_record.equations[0].ideal_gas.clone();
    monatomic.truncate(2);
    records[0]
        .model_record
        .ideal_gas_variants
        .insert("rigid".into(), monatomic);
    let options = MultiParameterOptions::new().variant("rigid");
    let rigid = Arc::new(MultiParameter::from_records(
        "ethane",
        &records,
        IdentifierOption::Name,
        &options,
    )?);
    let eos = ethane()?;

    let t = 300.0 * KELVIN;
    let rho = 100.0 * MOL / METER.powi::<P3>();
    let a = State::new_pure(&eos, t, rho)?;
    let b = State::new_pure(&rigid, t, rho)?;
    // only caloric properties change
    assert_relative_eq!(
        a.pressure(Contributions::Total),
        b.pressure(Contributions::Total),
        max_relative = 1e-14
    );
    assert_relative_eq!(
        b.molar_isochoric_heat_capacity(Contributions::IdealGas),
        3.003039265 * 8.314472 * JOULE / (MOL * KELVIN),
        max_relative = 1e-10
    );
    assert!(
        a.molar_isochoric_heat_capacity(Contributions::IdealGas)
            > b.molar_isochoric_heat_capacity(Contributions::IdealGas)
    );
    Ok(())
}

#[test]
fn phase_boundaries() -> MeosResult<()> {
    let eos = ethane()?;
    assert_relative_eq!(
        eos.melting_pressure(90.368 * KELVIN)?,
        1.14 * PASCAL,
        max_relative = 1e-6
    );
    assert!(eos.melting_pressure(100.0 * KELVIN)? > 1e7 * PASCAL);
    assert!(matches!(
        eos.melting_pressure(85.0 * KELVIN),
        Err(MeosError::OutOfRange { .. })
    ));
    assert!(matches!(
        eos.sublimation_pressure(85.0 * KELVIN),
        Err(MeosError::PropertyUnavailable(_))
    ));
    Ok(())
}

#[test]
fn saturation_temperature_estimate() -> MeosResult<()> {
    let eos = fluid("propane", &MultiParameterOptions::default())?;
    let ancillaries = eos.ancillaries().unwrap();
    for t in [100.0, 200.0, 300.0, 360.0] {
        let p = ancillaries.estimate(t).unwrap().pressure;
        assert_relative_eq!(
            eos.saturation_temperature_estimate(p).unwrap(),
            t,
            max_relative = 1e-9
        );
    }
    assert!(eos.saturation_temperature_estimate(5e6).is_none());
    Ok(())
}

#[test]
fn circular_ecs_references() -> MeosResult<()> {
    let mut records = records()?;
    records[0].model_record.ecs = Some(
        serde_json::from_str(
            r#"{"reference_fluid": "C3H8", "shape_factors": {"type": "conformal"}}"#,
        )
        .map_err(MeosError::from)?,
    );
    let error = MultiParameter::from_records(
        "propane",
        &records,
        IdentifierOption::Name,
        &MultiParameterOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, MeosError::Configuration(_)));
    assert!(error.to_string().contains("circular"));
    Ok(())
}

#[test]
fn reference_state_is_not_inherited() -> MeosResult<()> {
    let options = MultiParameterOptions::new().reference_state(ReferenceState::Nbp);
    let eos = fluid("propane", &options)?;
    let ecs = eos.ecs().unwrap();
    assert!(matches!(eos.reference_state(), ReferenceState::Nbp));
    assert!(matches!(
        ecs.reference_fluid().reference_state(),
        ReferenceState::Equation
    ));
    Ok(())
}
