use crate::HelmholtzEnergy;
use crate::errors::{MeosError, MeosResult};
use crate::solver::{bracketed_secant, find_brackets, geomspace};
use crate::state::DensityInitialization::{self, InitialDensity, Liquid, Vapor};

const SCAN_POINTS: usize = 150;

/// Calculate the density for given temperature and pressure (SI units).
///
/// Without an initialization, the stable phase is returned.
pub(crate) fn density_iteration<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    pressure: f64,
    initial_density: Option<DensityInitialization<f64>>,
) -> MeosResult<f64> {
    match initial_density {
        Some(init) => _density_iteration(eos, temperature, pressure, init).or_else(|e| {
            if e.is_recoverable() {
                density_scan(eos, temperature, pressure, Some(init))
            } else {
                Err(e)
            }
        }),
        None => _density_iteration_stable(eos, temperature, pressure),
    }
}

fn _density_iteration_stable<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    pressure: f64,
) -> MeosResult<f64> {
    // seed from the saturation densities if available
    let tc = eos.critical_constants().temperature;
    let (liquid_init, vapor_init) = match eos.saturation_estimate(temperature) {
        Some(e) if temperature < tc => (
            InitialDensity(e.liquid_density),
            InitialDensity(e.vapor_density),
        ),
        _ => (Liquid, Vapor),
    };
    let iterate = |first, second| {
        _density_iteration(eos, temperature, pressure, first)
            .or_else(|_| _density_iteration(eos, temperature, pressure, second))
    };

    // calculate stable phase
    let max_density = eos.max_density();
    let liquid = iterate(liquid_init, Liquid);
    let result = if pressure < max_density * eos.gas_constant() * temperature {
        let vapor = iterate(vapor_init, Vapor);
        match (&liquid, &vapor) {
            (Ok(_), Err(_)) => liquid,
            (Err(_), Ok(_)) => vapor,
            (Ok(l), Ok(v)) => {
                if eos.chemical_potential_si(temperature, *l)
                    > eos.chemical_potential_si(temperature, *v)
                {
                    vapor
                } else {
                    liquid
                }
            }
            _ => Err(MeosError::UndeterminedState(String::from(
                "Density iteration did not find a solution",
            ))),
        }
    } else {
        liquid
    };
    result.or_else(|_| density_scan(eos, temperature, pressure, None))
}

/// Bracketed fallback: scan the isotherm for all mechanically stable
/// roots of $p(\rho)=p$ and pick one according to the initialization.
pub(crate) fn density_scan<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    pressure: f64,
    initial_density: Option<DensityInitialization<f64>>,
) -> MeosResult<f64> {
    let max_density = eos.max_density();
    let ideal_gas_density = pressure / (eos.gas_constant() * temperature);
    let min_density = (0.01 * ideal_gas_density).min(1e-6 * max_density);
    let grid = geomspace(min_density, max_density, SCAN_POINTS);
    let f = |rho| Ok(eos.pressure_si(temperature, rho) - pressure);
    let roots: Vec<f64> = find_brackets(&grid, f)
        .into_iter()
        .filter_map(|bracket| bracketed_secant("density_scan", f, bracket, 1e-13).ok())
        .filter(|&rho| eos.p_dpdrho(temperature, rho).1 > 0.0)
        .collect();

    let root = match initial_density {
        Some(Liquid) => roots.iter().copied().reduce(f64::max),
        Some(Vapor) => roots.iter().copied().reduce(f64::min),
        Some(InitialDensity(d)) => roots
            .iter()
            .copied()
            .reduce(|a, b| if (a - d).abs() <= (b - d).abs() { a } else { b }),
        None => roots.iter().copied().reduce(|a, b| {
            if eos.chemical_potential_si(temperature, a)
                <= eos.chemical_potential_si(temperature, b)
            {
                a
            } else {
                b
            }
        }),
    };
    root.ok_or_else(|| {
        MeosError::UndeterminedState(format!(
            "no density found for T = {temperature} K and p = {pressure} Pa"
        ))
    })
}

pub(crate) fn _density_iteration<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    pressure: f64,
    initial_density: DensityInitialization<f64>,
) -> MeosResult<f64> {
    let maxdensity = eos.max_density();
    let initial_density = match initial_density {
        Vapor => pressure / (eos.gas_constant() * temperature),
        Liquid => maxdensity,
        InitialDensity(d) => d,
    };
    let (abstol, reltol) = (1e-12 * pressure.max(1.0), 1e-14);

    let mut rho = initial_density;
    if !(rho > 0.0) || !rho.is_finite() {
        return Err(MeosError::InvalidState(
            String::from("density iteration"),
            String::from("density"),
            rho,
        ));
    }

    let maxiter = 50;
    for k in 0..maxiter {
        let (mut p, mut dp_drho) = eos.p_dpdrho(temperature, rho);

        // attempt to correct for poor initial density rho_init
        if dp_drho.is_sign_negative() && k == 0 {
            rho = if initial_density <= 0.15 * maxdensity {
                0.05 * initial_density
            } else {
                (1.1 * initial_density).min(maxdensity)
            };
            (p, dp_drho) = eos.p_dpdrho(temperature, rho);
        }

        let mut error = p - pressure;

        let mut delta_rho = -error / dp_drho;
        if delta_rho.abs() > 0.075 * maxdensity {
            delta_rho = 0.075 * maxdensity * delta_rho.signum();
        };
        delta_rho = delta_rho.max(-0.95 * rho); // prevent stepping to rho < 0.0

        // correction for instable region
        if dp_drho.is_sign_negative() {
            let (_, _, d2pdrho2) = eos.p_dpdrho_d2pdrho2(temperature, rho);

            if rho > 0.85 * maxdensity {
                let (sp_p, sp_rho) = _pressure_spinodal(eos, temperature, initial_density)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if rho > 0.85 * maxdensity {
                    if error.is_sign_negative() {
                        return Err(MeosError::IterationFailed(String::from(
                            "density_iteration",
                        )));
                    } else {
                        rho *= 0.98
                    }
                } else if error.is_sign_positive() {
                    rho = 0.001 * maxdensity
                } else {
                    rho = (rho * 1.1).min(maxdensity)
                }
            } else if error.is_sign_positive() && d2pdrho2.is_sign_positive() {
                let (sp_p, sp_rho) = _pressure_spinodal(eos, temperature, initial_density)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if error.is_sign_positive() {
                    rho = 0.001 * maxdensity
                } else {
                    rho = (rho * 1.1).min(maxdensity)
                }
            } else if error.is_sign_negative() && d2pdrho2.is_sign_negative() {
                let (sp_p, sp_rho) = _pressure_spinodal(eos, temperature, initial_density)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if error.is_sign_negative() {
                    rho = 0.8 * maxdensity
                } else {
                    rho *= 0.8
                }
            } else if error.is_sign_negative() && d2pdrho2.is_sign_positive() {
                let (_, rho_l) = _pressure_spinodal(eos, temperature, 0.8 * maxdensity)?;
                let (sp_v_p, rho_v) = _pressure_spinodal(eos, temperature, 0.001 * maxdensity)?;
                error = sp_v_p - pressure;
                if error.is_sign_positive()
                    && (initial_density - rho_v).abs() < (initial_density - rho_l).abs()
                {
                    rho = 0.8 * rho_v
                } else {
                    rho = (rho_l * 1.1).min(maxdensity)
                }
            } else if error.is_sign_positive() && d2pdrho2.is_sign_negative() {
                let (_, rho_l) = _pressure_spinodal(eos, temperature, 0.8 * maxdensity)?;
                let (sp_v_p, rho_v) = _pressure_spinodal(eos, temperature, 0.001 * maxdensity)?;
                error = sp_v_p - pressure;
                if error.is_sign_negative()
                    && (initial_density - rho_v).abs() > (initial_density - rho_l).abs()
                {
                    rho = (rho_l * 1.1).min(maxdensity)
                } else {
                    rho = 0.8 * rho_v
                }
            } else {
                rho = (rho + initial_density) * 0.5;
                if (rho - initial_density).abs() < 1e-8 * maxdensity {
                    rho = (rho + 0.1 * maxdensity).min(maxdensity)
                }
            }
            continue;
        }
        // Newton step
        rho += delta_rho;
        if error.abs() < f64::max(abstol, pressure * reltol) {
            return Ok(rho);
        }
    }
    Err(MeosError::not_converged("density_iteration", maxiter, rho))
}

/// Find a spinodal ($\partial p/\partial\rho=0$) starting from `rho_init`.
///
/// Returns the pressure and density at the spinodal.
pub(crate) fn _pressure_spinodal<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    rho_init: f64,
) -> MeosResult<(f64, f64)> {
    let maxiter = 30;
    let abstol = 1e-8 * eos.gas_constant() * temperature;

    let maxdensity = eos.max_density();
    let mut rho = rho_init;

    if rho <= 0.0 {
        return Err(MeosError::InvalidState(
            String::from("pressure spinodal"),
            String::from("density"),
            rho,
        ));
    }

    for _ in 0..maxiter {
        let (p, dpdrho, d2pdrho2) = eos.p_dpdrho_d2pdrho2(temperature, rho);

        let mut delta_rho = -dpdrho / d2pdrho2;
        if delta_rho.abs() > 0.05 * maxdensity {
            delta_rho = 0.05 * maxdensity * delta_rho.signum()
        }
        delta_rho = delta_rho.max(-rho * 0.95); // prevent stepping to rho < 0.0
        delta_rho = delta_rho.min(maxdensity - rho); // prevent stepping to rho > maxdensity
        rho += delta_rho;

        if dpdrho.abs() < abstol {
            return Ok((p, rho));
        }
    }
    Err(MeosError::not_converged("pressure_spinodal", maxiter, rho))
}
