use super::{PhaseEquilibrium, TRIVIAL_REL_DEVIATION, TemperatureOrPressure};
use crate::density_iteration::{_density_iteration, _pressure_spinodal, density_iteration};
use crate::equation_of_state::{HelmholtzEnergy, ReducedVariables};
use crate::errors::{MeosError, MeosResult};
use crate::state::{DensityInitialization, Phase, State};
use crate::{SolverOptions, Verbosity};
use nalgebra::{Matrix2, Vector2};
use quantity::{KELVIN, PASCAL, Pressure, Temperature};

const MAX_ITER_PURE: usize = 50;
const TOL_PURE: f64 = 1e-12;
/// Relative distance to the critical temperature or pressure below which
/// the critical point is returned.
const CRITICAL_REL_DEVIATION: f64 = 1e-6;
/// Residuals of the saturation conditions at the level of round-off errors.
const ROUNDOFF: f64 = 1e-14;

/// # Pure component phase equilibria
impl<E: HelmholtzEnergy> PhaseEquilibrium<E, 2> {
    /// Calculate a phase equilibrium for a pure component.
    pub fn pure<TP: TemperatureOrPressure>(
        eos: &E,
        temperature_or_pressure: TP,
        initial_state: Option<&Self>,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        match (
            temperature_or_pressure.temperature(),
            temperature_or_pressure.pressure(),
        ) {
            (Some(t), _) => Self::pure_t(eos, t, initial_state, options),
            (None, Some(p)) => Self::pure_p(eos, p, initial_state, options),
            (None, None) => Err(MeosError::UndeterminedState(format!(
                "missing {}",
                TP::IDENTIFIER
            ))),
        }
    }

    /// Calculate a phase equilibrium for a pure component
    /// and given temperature.
    ///
    /// The equality of pressure and Gibbs energy is solved with a
    /// Newton iteration in the reduced densities of both phases. Initial
    /// values are taken (in this order) from the initial state, the
    /// ancillary equations, the critical scaling law, the ideal gas and the
    /// spinodals. The pressure iteration serves as the last resort.
    pub fn pure_t(
        eos: &E,
        temperature: Temperature,
        initial_state: Option<&Self>,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        let t = temperature.convert_into(KELVIN);
        let cc = eos.critical_constants();
        if (1.0 - t / cc.temperature).abs() < CRITICAL_REL_DEVIATION {
            return Ok(Self::critical_point(eos));
        }
        if t > cc.temperature {
            return Err(MeosError::SuperCritical);
        }
        let t_min = eos.limits().t_min;
        if !(t >= t_min) {
            return Err(MeosError::out_of_range(
                "temperature",
                t,
                t_min,
                cc.temperature,
            ));
        }

        let initial = initial_state.map(|vle| [vle.vapor().rho(), vle.liquid().rho()]);
        let ancillary = eos
            .saturation_estimate(t)
            .map(|e| [e.vapor_density, e.liquid_density]);
        let theta = 1.0 - t / cc.temperature;
        let critical = (theta < 0.01).then(|| {
            let d = 2.0 * theta.powf(0.35);
            [cc.density * (1.0 - d), cc.density * (1.0 + d)]
        });
        let seeds = initial
            .into_iter()
            .chain(ancillary)
            .chain(critical)
            .chain(std::iter::once_with(|| _init_pure_ideal_gas(eos, t).1))
            .chain(std::iter::once_with(|| _init_pure_spinodal(eos, t).ok().map(|s| s.1)).flatten());

        for seed in seeds {
            match solve_pure_t(eos, t, seed, options) {
                Ok(densities) => return Ok(Self::from_densities(eos, t, densities)),
                Err(e) => log_result!(options.verbosity, "PhaseEquilibrium::pure_t: {e}"),
            }
        }

        // Fall back to the pressure iteration
        let fallback = iterate_pure_t(eos, t, _init_pure_ideal_gas(eos, t), options).or_else(|_| {
            _init_pure_spinodal(eos, t).and_then(|vle| iterate_pure_t(eos, t, vle, options))
        });
        match fallback {
            Ok((_, densities)) => Ok(Self::from_densities(eos, t, densities)),
            Err(MeosError::TrivialSolution) => Err(MeosError::SuperCritical),
            Err(e) => Err(e),
        }
    }

    fn from_densities(eos: &E, temperature: f64, [rho_v, rho_l]: [f64; 2]) -> Self {
        Self([
            State::new_unchecked(eos, temperature, rho_v).with_phase(Phase::Vapor),
            State::new_unchecked(eos, temperature, rho_l).with_phase(Phase::Liquid),
        ])
    }

    /// Calculate a phase equilibrium for a pure component
    /// and given pressure.
    pub fn pure_p(
        eos: &E,
        pressure: Pressure,
        initial_state: Option<&Self>,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        let p = pressure.convert_into(PASCAL);
        let p_crit = eos.critical_pressure_si();
        if !(p > 0.0) || !p.is_finite() {
            return Err(MeosError::out_of_range("pressure", p, 0.0, p_crit));
        }
        if (1.0 - p / p_crit).abs() < CRITICAL_REL_DEVIATION {
            return Ok(Self::critical_point(eos));
        }
        if p > p_crit {
            return Err(MeosError::SuperCritical);
        }
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);

        // Initialize the phase equilibrium
        let mut vle = match initial_state {
            Some(init) => init
                .clone()
                .update_pressure(init.vapor().t(), p)?
                .check_trivial_solution()?,
            None => Self::init_pure_p(eos, p, p_crit, options)?,
        };

        log_iter!(
            verbosity,
            " iter |     residual     |   temperature   |    liquid density    |    vapor density     "
        );
        log_iter!(verbosity, "{:-<89}", "");
        log_iter!(
            verbosity,
            " {:4} |                  | {:13.8} | {:12.8} | {:12.8}",
            0,
            vle.vapor().temperature,
            vle.liquid().density,
            vle.vapor().density
        );
        let r = eos.gas_constant();
        for i in 1..=max_iter {
            let (liquid, vapor) = (vle.liquid(), vle.vapor());
            let t = vapor.t();

            // calculate the pressures and derivatives
            let (p_l, p_rho_l, p_t_l) = (liquid.p_si(), liquid.dp_drho_si(), liquid.dp_dt_si());
            let (p_v, p_rho_v, p_t_v) = (vapor.p_si(), vapor.dp_drho_si(), vapor.dp_dt_si());

            // calculate the residual molar entropies and Helmholtz energies
            let (s_l_res, s_v_res) = (liquid.residual_entropy_si(), vapor.residual_entropy_si());
            let (a_l_res, a_v_res) = (
                liquid.residual_helmholtz_energy_si(),
                vapor.residual_helmholtz_energy_si(),
            );

            // calculate the molar volumes
            let v_l = 1.0 / liquid.rho();
            let v_v = 1.0 / vapor.rho();

            // estimate the temperature steps
            let ln_rho = (v_l / v_v).ln();
            let delta_t = (p * (v_v - v_l) + (a_v_res - a_l_res + r * t * ln_rho))
                / (s_v_res - s_l_res - r * ln_rho);
            let t_new = t + delta_t;

            // calculate Newton steps for the densities and update state.
            let rho_l = liquid.rho() + (p - p_l - p_t_l * delta_t) / p_rho_l;
            let rho_v = vapor.rho() + (p - p_v - p_t_v * delta_t) / p_rho_v;

            if !delta_t.is_finite() {
                return Err(MeosError::IterationFailed("pure_p".to_owned()));
            }
            if rho_l.is_sign_negative() || rho_v.is_sign_negative() || delta_t.abs() > 1.0 {
                // if densities are negative or the temperature step is large use density iteration instead
                vle = vle.update_pressure(t_new, p)?.check_trivial_solution()?;
            } else {
                // update state
                vle = Self::from_densities(eos, t_new, [rho_v, rho_l]);
            }

            // check for convergence
            let res = delta_t.abs();
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:13.8} | {:12.8} | {:12.8}",
                i,
                res,
                vle.vapor().temperature,
                vle.liquid().density,
                vle.vapor().density
            );
            if res < vle.vapor().t() * tol {
                log_result!(
                    verbosity,
                    "PhaseEquilibrium::pure_p: calculation converged in {} step(s)\n",
                    i
                );
                return Ok(vle);
            }
        }
        Err(MeosError::not_converged("pure_p", max_iter, vle.vapor().t()))
    }

    /// Initialize a new VLE for a pure substance for a given pressure.
    ///
    /// The temperature is estimated from the inverse vapor pressure
    /// ancillary or, without ancillaries, from a Clausius-Clapeyron line
    /// through the critical point.
    fn init_pure_p(eos: &E, pressure: f64, p_crit: f64, options: SolverOptions) -> MeosResult<Self> {
        let tc = eos.critical_constants().temperature;
        let t_min = eos.limits().t_min;
        let t0 = match eos.saturation_temperature_estimate(pressure) {
            Some(t0) => t0,
            None => {
                let t1 = (0.7 * tc).max(t_min);
                let p1 = Self::pure_t(eos, t1 * KELVIN, None, options)?
                    .vapor()
                    .p_si();
                let b = (p_crit / p1).ln() / (1.0 / t1 - 1.0 / tc);
                1.0 / (1.0 / tc + (p_crit / pressure).ln() / b)
            }
        };

        // pressures below the vapor pressure at the minimum temperature are out of range
        if !(t0 > 1.1 * t_min) {
            let p_min = Self::pure_t(eos, t_min * KELVIN, None, options)?
                .vapor()
                .p_si();
            if pressure < p_min {
                return Err(MeosError::out_of_range(
                    "pressure", pressure, p_min, p_crit,
                ));
            }
        }
        let t0 = t0.clamp(t_min, tc * (1.0 - 1e-5));
        Self::pure_t(eos, t0 * KELVIN, None, options)
    }

    fn update_pressure(self, temperature: f64, pressure: f64) -> MeosResult<Self> {
        let [vapor, liquid] = self.0;
        let rho_v = density_iteration(
            &vapor.eos,
            temperature,
            pressure,
            Some(DensityInitialization::InitialDensity(vapor.rho())),
        )?;
        let rho_l = density_iteration(
            &liquid.eos,
            temperature,
            pressure,
            Some(DensityInitialization::InitialDensity(liquid.rho())),
        )?;
        Ok(Self::from_densities(&vapor.eos, temperature, [rho_v, rho_l]))
    }

    /// Calculate the vapor pressure of a pure component for the given temperature.
    pub fn vapor_pressure(eos: &E, temperature: Temperature) -> MeosResult<Pressure> {
        Ok(PhaseEquilibrium::pure_t(eos, temperature, None, SolverOptions::default())?
            .vapor()
            .pressure(crate::Contributions::Total))
    }

    /// Calculate the boiling temperature of a pure component for the given pressure.
    pub fn boiling_temperature(eos: &E, pressure: Pressure) -> MeosResult<Temperature> {
        Ok(PhaseEquilibrium::pure_p(eos, pressure, None, SolverOptions::default())?
            .vapor()
            .temperature)
    }
}

/// Newton iteration in $(\ln\delta'',\delta')$ for the equality of
/// $J=\delta\left(1+\delta\alpha^\mathrm{r}_\delta\right)$ and
/// $K=\delta\alpha^\mathrm{r}_\delta+\alpha^\mathrm{r}+\ln\delta$ in both phases.
///
/// Returns the vapor and liquid densities.
fn solve_pure_t<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    [rho_v, rho_l]: [f64; 2],
    options: SolverOptions,
) -> MeosResult<[f64; 2]> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);
    let (t_red, rho_red) = eos.reducing_point();
    let tau = t_red / temperature;
    let delta_max = eos.max_density() / rho_red;
    let (mut delta_v, mut delta_l) = (rho_v / rho_red, rho_l / rho_red);
    if !(delta_v > 0.0 && delta_l > delta_v) {
        return Err(MeosError::IterationFailed(
            "pure_t: invalid initial densities".to_owned(),
        ));
    }

    // J, K, their derivatives and the magnitude of their terms
    let conditions = |delta: f64| {
        let r = eos.residual_derivatives(ReducedVariables { delta, tau });
        let j = delta * (1.0 + delta * r.a_d);
        let k = delta * r.a_d + r.a + delta.ln();
        let j_d = 1.0 + 2.0 * delta * r.a_d + delta * delta * r.a_dd;
        let k_d = 2.0 * r.a_d + delta * r.a_dd + 1.0 / delta;
        let scale_j = delta * (1.0 + (delta * r.a_d).abs());
        let scale_k = (delta * r.a_d).abs() + r.a.abs() + delta.ln().abs();
        ([j, k], [j_d, k_d], [scale_j, scale_k])
    };

    log_iter!(
        verbosity,
        " iter |    residual    |    liquid density    |    vapor density     "
    );
    log_iter!(verbosity, "{:-<70}", "");
    for i in 1..=max_iter {
        if (delta_v / delta_l - 1.0).abs() < TRIVIAL_REL_DEVIATION {
            return Err(MeosError::TrivialSolution);
        }
        let ([j_v, k_v], [j_d_v, k_d_v], [sj_v, sk_v]) = conditions(delta_v);
        let ([j_l, k_l], [j_d_l, k_d_l], [sj_l, sk_l]) = conditions(delta_l);
        let f = Vector2::new(j_v - j_l, k_v - k_l);
        if f[0].abs() < ROUNDOFF * (sj_v + sj_l) && f[1].abs() < ROUNDOFF * (sk_v + sk_l) {
            return check_stability(eos, temperature, [delta_v, delta_l], rho_red, i, verbosity);
        }

        // the vapor density is iterated logarithmically
        let jacobian = Matrix2::new(j_d_v * delta_v, -j_d_l, k_d_v * delta_v, -k_d_l);
        let step = -jacobian
            .try_inverse()
            .ok_or_else(|| MeosError::IterationFailed("pure_t: singular Jacobian".to_owned()))?
            * f;
        let ln_step_v = step[0].clamp(-1.0, 1.0);
        let step_l = step[1];
        if !ln_step_v.is_finite() || !step_l.is_finite() {
            return Err(MeosError::IterationFailed("pure_t".to_owned()));
        }

        // damp the step to keep the liquid denser than the vapor
        let mut lambda = 1.0;
        while !(delta_l + lambda * step_l > delta_v * (lambda * ln_step_v).exp()
            && delta_l + lambda * step_l < delta_max)
        {
            lambda *= 0.5;
            if lambda < 1e-4 {
                return Err(MeosError::IterationFailed("pure_t: step control".to_owned()));
            }
        }
        delta_v *= (lambda * ln_step_v).exp();
        delta_l += lambda * step_l;

        let res = (lambda * ln_step_v).abs() + (lambda * step_l / delta_l).abs();
        log_iter!(
            verbosity,
            " {:4} | {:14.8e} | {:20.12e} | {:20.12e}",
            i,
            res,
            delta_l * rho_red,
            delta_v * rho_red
        );
        if res < tol {
            return check_stability(eos, temperature, [delta_v, delta_l], rho_red, i, verbosity);
        }
    }
    Err(MeosError::not_converged(
        "pure_t",
        max_iter,
        delta_v * rho_red,
    ))
}

/// Reject solutions on the unstable branch of the isotherm.
fn check_stability<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    [delta_v, delta_l]: [f64; 2],
    rho_red: f64,
    iterations: usize,
    verbosity: Verbosity,
) -> MeosResult<[f64; 2]> {
    if (delta_v / delta_l - 1.0).abs() < TRIVIAL_REL_DEVIATION {
        return Err(MeosError::TrivialSolution);
    }
    let densities = [delta_v * rho_red, delta_l * rho_red];
    if densities
        .iter()
        .any(|&rho| !(eos.p_dpdrho(temperature, rho).1 > 0.0))
    {
        return Err(MeosError::IterationFailed(
            "pure_t: mechanically unstable solution".to_owned(),
        ));
    }
    log_result!(
        verbosity,
        "PhaseEquilibrium::pure_t: calculation converged in {} step(s)\n",
        iterations
    );
    Ok(densities)
}

fn iterate_pure_t<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
    (mut pressure, [mut vapor_density, mut liquid_density]): (f64, [f64; 2]),
    options: SolverOptions,
) -> MeosResult<(f64, [f64; 2])> {
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);
    let rt = eos.gas_constant() * temperature;

    // molar residual Helmholtz energy, pressure and its density derivative
    let a_p_dpdrho = |rho: f64| {
        let rv = eos.reduced_variables(temperature, rho);
        let r = eos.residual_derivatives(rv);
        let d = rv.delta;
        (
            rt * r.a,
            rho * rt * (1.0 + d * r.a_d),
            rt * (1.0 + 2.0 * d * r.a_d + d * d * r.a_dd),
        )
    };

    log_iter!(
        verbosity,
        " iter |    residual    |     pressure     |    liquid density    |    vapor density     | Newton steps"
    );
    log_iter!(verbosity, "{:-<103}", "");
    log_iter!(
        verbosity,
        " {:4} |                | {:12.8} | {:12.8} | {:12.8} |",
        0,
        pressure,
        liquid_density,
        vapor_density
    );

    for i in 1..=max_iter {
        // calculate properties
        let (a_l_res, p_l, p_rho_l) = a_p_dpdrho(liquid_density);
        let (a_v_res, p_v, p_rho_v) = a_p_dpdrho(vapor_density);

        // Estimate the new pressure
        let v_v = vapor_density.recip();
        let v_l = liquid_density.recip();
        let delta_v = v_v - v_l;
        let delta_a = a_v_res - a_l_res + rt * (vapor_density / liquid_density).ln();
        let mut p_new = -delta_a / delta_v;

        // If the pressure becomes negative, assume the gas phase is ideal. The
        // resulting pressure is always positive.
        if p_new.is_sign_negative() {
            p_new = p_v * ((-delta_a - p_v / vapor_density) / rt).exp();
        }

        // Improve the estimate by exploiting the almost ideal behavior of the gas phase
        let mut newton_iter = 0;
        let newton_tol = pressure * delta_v * tol;
        for _ in 0..20 {
            let p_frac = p_new / pressure;
            let f = p_new * delta_v + delta_a + (p_frac.ln() + 1.0 - p_frac) * rt;
            let df_dp = delta_v + (1.0 / p_new - 1.0 / pressure) * rt;
            p_new -= f / df_dp;
            newton_iter += 1;
            if f.abs() < newton_tol {
                break;
            }
        }

        // Emergency brake if the implementation of the EOS is not safe.
        if p_new.is_nan() {
            return Err(MeosError::IterationFailed("pure_t".to_owned()));
        }

        // Calculate Newton steps for the densities and update state.
        liquid_density += (p_new - p_l) / p_rho_l;
        vapor_density += (p_new - p_v) / p_rho_v;
        if (vapor_density / liquid_density - 1.0).abs() < TRIVIAL_REL_DEVIATION {
            return Err(MeosError::TrivialSolution);
        }

        // Check for convergence
        let res = (p_new - pressure).abs();
        log_iter!(
            verbosity,
            " {:4} | {:14.8e} | {:12.8} | {:12.8} | {:12.8} | {}",
            i,
            res,
            p_new,
            liquid_density,
            vapor_density,
            newton_iter
        );
        if res < pressure * tol {
            log_result!(
                verbosity,
                "PhaseEquilibrium::pure_t: pressure iteration converged in {} step(s)\n",
                i
            );
            return Ok((pressure, [vapor_density, liquid_density]));
        }
        pressure = p_new;
    }
    Err(MeosError::not_converged("pure_t", max_iter, pressure))
}

fn _init_pure_ideal_gas<E: HelmholtzEnergy>(eos: &E, temperature: f64) -> (f64, [f64; 2]) {
    let rho_l = 0.75 * eos.max_density();
    let rv = eos.reduced_variables(temperature, rho_l);
    let a_res = eos.residual_derivatives(rv).a;
    let rt = eos.gas_constant() * temperature;
    let p = rt * rho_l * (a_res - 1.0).exp();
    let rho_v = p / rt;
    (p, [rho_v, rho_l])
}

fn _init_pure_spinodal<E: HelmholtzEnergy>(
    eos: &E,
    temperature: f64,
) -> MeosResult<(f64, [f64; 2])> {
    let maxdensity = eos.max_density();
    let (p_l, _) = _pressure_spinodal(eos, temperature, 0.8 * maxdensity)?;
    let (p_v, _) = _pressure_spinodal(eos, temperature, 0.001 * maxdensity)?;
    let p = 0.5 * (0.0_f64.max(p_l) + p_v);
    let rho_l = _density_iteration(eos, temperature, p, DensityInitialization::Liquid)?;
    let rho_v = _density_iteration(eos, temperature, p, DensityInitialization::Vapor)?;
    Ok((p, [rho_v, rho_l]))
}
