use typenum::P3;
use super::{ethane, propane};
use approx::assert_relative_eq;
use meos_core::{
    Contributions, HelmholtzEnergyDyn, MeosError, MeosResult, Phase, PhaseDiagram,
    PhaseEquilibrium, SolverOptions,
};
use quantity::*;

#[test]
fn triple_point() -> MeosResult<()> {
    let eos = ethane()?;
    let vle = PhaseEquilibrium::pure(&eos, 90.368 * KELVIN, None, SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        1.0934116 * PASCAL,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        vle.liquid().mass_density(),
        651.814 * KILOGRAM / METER.powi::<P3>(),
        max_relative = 1e-5
    );
    assert_relative_eq!(
        vle.vapor().density,
        1.4552461e-3 * MOL / METER.powi::<P3>(),
        max_relative = 1e-6
    );

    // reference equation of Buecker and Wagner: 1.1e-6 MPa, 651.53 kg/m³ and 4.6e-5 kg/m³
    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        1.1 * PASCAL,
        max_relative = 1e-2
    );
    assert_relative_eq!(
        vle.liquid().mass_density(),
        651.53 * KILOGRAM / METER.powi::<P3>(),
        max_relative = 1e-3
    );
    assert_relative_eq!(
        vle.vapor().mass_density(),
        4.6e-5 * KILOGRAM / METER.powi::<P3>(),
        max_relative = 6e-2
    );
    Ok(())
}

#[test]
fn saturation_temperature() -> MeosResult<()> {
    let eos = ethane()?;
    let vle = PhaseEquilibrium::pure(&eos, 200.0 * KELVIN, None, SolverOptions::default())?;
    let p = vle.vapor().pressure(Contributions::Total);
    assert_relative_eq!(p, 217111.0 * PASCAL, max_relative = 1e-6);
    assert_relative_eq!(
        vle.liquid().density,
        17396.439 * MOL / METER.powi::<P3>(),
        max_relative = 1e-6
    );
    assert_relative_eq!(
        vle.vapor().density,
        138.68890 * MOL / METER.powi::<P3>(),
        max_relative = 1e-6
    );
    assert_relative_eq!(
        vle.liquid().pressure(Contributions::Total),
        p,
        max_relative = 1e-8
    );
    assert_relative_eq!(
        vle.liquid().molar_gibbs_energy(Contributions::Total),
        vle.vapor().molar_gibbs_energy(Contributions::Total),
        max_relative = 1e-8
    );
    assert_eq!(vle.liquid().phase(), Phase::Liquid);
    assert_eq!(vle.vapor().phase(), Phase::Vapor);
    Ok(())
}

#[test]
fn saturation_pressure() -> MeosResult<()> {
    let eos = ethane()?;
    let vle = PhaseEquilibrium::pure(&eos, 217111.0 * PASCAL, None, SolverOptions::default())?;
    assert_relative_eq!(vle.vapor().temperature, 200.0 * KELVIN, max_relative = 1e-6);
    assert_relative_eq!(vle.liquid().temperature, vle.vapor().temperature);

    let eos = propane()?;
    let t = PhaseEquilibrium::boiling_temperature(&eos, 996876.153 * PASCAL)?;
    assert_relative_eq!(t, 300.0 * KELVIN, max_relative = 1e-7);
    Ok(())
}

#[test]
fn near_critical() -> MeosResult<()> {
    let eos = ethane()?;
    let vle = PhaseEquilibrium::pure(&eos, 305.3 * KELVIN, None, SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        4856392.3 * PASCAL,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        vle.liquid().density,
        7394.563 * MOL / METER.powi::<P3>(),
        max_relative = 1e-4
    );
    assert_relative_eq!(
        vle.vapor().density,
        5823.606 * MOL / METER.powi::<P3>(),
        max_relative = 1e-4
    );

    // above the critical temperature of the reference equation
    let vle = PhaseEquilibrium::pure(&eos, 305.4 * KELVIN, None, SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        4866395.9 * PASCAL,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        vle.liquid().density,
        7142.937 * MOL / METER.powi::<P3>(),
        max_relative = 1e-4
    );
    assert_relative_eq!(
        vle.vapor().density,
        6006.271 * MOL / METER.powi::<P3>(),
        max_relative = 1e-4
    );
    let vle = PhaseEquilibrium::pure(&eos, 305.5 * KELVIN, None, SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(Contributions::Total),
        4876388.1 * PASCAL,
        max_relative = 1e-6
    );
    Ok(())
}

#[test]
fn critical_point_of_the_equation() -> MeosResult<()> {
    use meos_core::HelmholtzEnergy;
    for eos in [ethane()?, propane()?] {
        let cc = eos.critical_constants();
        let (p, dp, d2p) = eos.p_dpdrho_d2pdrho2(cc.temperature, cc.density);
        let rt = eos.gas_constant() * cc.temperature;
        assert!((dp / rt).abs() < 1e-7);
        assert!((d2p * cc.density / rt).abs() < 1e-5);
        assert_relative_eq!(p, cc.pressure, max_relative = 1e-7);
        assert_relative_eq!(eos.critical_pressure_si(), cc.pressure, max_relative = 1e-7);
    }
    Ok(())
}

#[test]
fn critical_point() -> MeosResult<()> {
    let eos = ethane()?;
    let cc = eos.critical_constants();
    let vle = PhaseEquilibrium::pure(&eos, cc.temperature * KELVIN, None, SolverOptions::default())?;
    assert_eq!(vle.liquid().phase(), Phase::Critical);
    assert_relative_eq!(vle.liquid().density, vle.vapor().density);
    assert_relative_eq!(
        vle.liquid().mass_density(),
        196.3982 * KILOGRAM / METER.powi::<P3>(),
        max_relative = 1e-6
    );
    // 206.18 kg/m³ at 305.322 K for the reference equation of Buecker and Wagner
    assert_relative_eq!(
        vle.liquid().mass_density(),
        206.18 * KILOGRAM / METER.powi::<P3>(),
        max_relative = 5e-2
    );
    assert_relative_eq!(cc.temperature, 305.322, max_relative = 1e-3);

    // the saturated densities close in on the critical density
    let mut width = f64::INFINITY;
    for theta in [1e-3, 1e-4, 1e-5, 2e-6] {
        let t = cc.temperature * (1.0 - theta);
        let vle = PhaseEquilibrium::pure(&eos, t * KELVIN, None, SolverOptions::default())?;
        let rho_l = vle.liquid().density.convert_into(MOL / METER.powi::<P3>());
        let rho_v = vle.vapor().density.convert_into(MOL / METER.powi::<P3>());
        assert!(rho_l > cc.density && rho_v < cc.density);
        assert!(rho_l - rho_v < width);
        width = rho_l - rho_v;
    }
    assert!(width / cc.density < 0.02);
    let t = cc.temperature * (1.0 - 5e-7);
    let vle = PhaseEquilibrium::pure(&eos, t * KELVIN, None, SolverOptions::default())?;
    assert_eq!(vle.vapor().phase(), Phase::Critical);

    let t = cc.temperature * (1.0 + 5e-6);
    assert!(matches!(
        PhaseEquilibrium::pure(&eos, t * KELVIN, None, SolverOptions::default()),
        Err(MeosError::SuperCritical)
    ));
    assert!(matches!(
        PhaseEquilibrium::pure(&eos, 310.0 * KELVIN, None, SolverOptions::default()),
        Err(MeosError::SuperCritical)
    ));
    assert!(matches!(
        PhaseEquilibrium::pure(&eos, 49.0 * BAR, None, SolverOptions::default()),
        Err(MeosError::SuperCritical)
    ));
    assert!(matches!(
        PhaseEquilibrium::pure(&eos, 80.0 * KELVIN, None, SolverOptions::default()),
        Err(MeosError::OutOfRange { .. })
    ));

    // the vapor pressure curve ends at the critical pressure
    let p = 0.9999 * cc.pressure;
    let vle = PhaseEquilibrium::pure(&eos, p * PASCAL, None, SolverOptions::default())?;
    assert!(vle.vapor().temperature < cc.temperature * KELVIN);
    assert!(vle.liquid().density > vle.vapor().density);
    Ok(())
}

#[test]
fn ancillary_equations() -> MeosResult<()> {
    for eos in [ethane()?, propane()?] {
        let tc = eos.critical_constants().temperature;
        for t in [0.5 * tc, 0.7 * tc, 0.9 * tc] {
            let vle = PhaseEquilibrium::pure(&eos, t * KELVIN, None, SolverOptions::default())?;
            let estimate = eos.saturation_estimate(t).unwrap();
            assert_relative_eq!(
                estimate.pressure,
                vle.vapor().pressure(Contributions::Total).convert_into(PASCAL),
                max_relative = 2e-2
            );
            assert_relative_eq!(
                estimate.liquid_density,
                vle.liquid().density.convert_into(MOL / METER.powi::<P3>()),
                max_relative = 5e-3
            );
            assert_relative_eq!(
                estimate.vapor_density,
                vle.vapor().density.convert_into(MOL / METER.powi::<P3>()),
                max_relative = 5e-2
            );
        }
    }
    Ok(())
}

#[test]
fn phase_diagram() -> MeosResult<()> {
    let eos = propane()?;
    let diagram = PhaseDiagram::pure(&eos, 150.0 * KELVIN, 20, SolverOptions::default())?;
    let liquid = diagram.liquid();
    let vapor = diagram.vapor();
    assert_eq!(liquid.len(), 20);
    for (l, v) in liquid.iter().zip(&vapor).take(19) {
        assert!(l.density > v.density);
    }
    let critical = liquid[19];
    assert_relative_eq!(
        critical.temperature,
        eos.critical_constants().temperature * KELVIN
    );
    Ok(())
}
