use super::{DensityInitialization, State, validate};
use crate::density_iteration::density_iteration;
use crate::equation_of_state::HelmholtzEnergy;
use crate::errors::{MeosError, MeosResult};
use crate::phase_equilibria::PhaseEquilibrium;
use crate::solver::{bracketed_secant, find_brackets, geomspace, newton};
use crate::{SolverOptions, Verbosity};
use nalgebra::{Matrix2, Vector2};
use quantity::*;

const SCAN_POINTS: usize = 60;
const XTOL: f64 = 1e-12;
const MAX_ITER_HS: usize = 50;
const TOL_HS: f64 = 1e-11;

/// Caloric property used as input of a flash calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Caloric {
    Enthalpy,
    Entropy,
    InternalEnergy,
}

impl Caloric {
    fn name(self) -> &'static str {
        match self {
            Self::Enthalpy => "molar enthalpy",
            Self::Entropy => "molar entropy",
            Self::InternalEnergy => "molar internal energy",
        }
    }

    fn value<E: HelmholtzEnergy>(self, state: &State<E>) -> f64 {
        match self {
            Self::Enthalpy => state.h_si(),
            Self::Entropy => state.s_si(),
            Self::InternalEnergy => state.u_si(),
        }
    }

    /// Derivative w.r.t. density at constant temperature.
    fn drho<E: HelmholtzEnergy>(self, state: &State<E>) -> f64 {
        match self {
            Self::Enthalpy => state.dh_drho_si(),
            Self::Entropy => state.ds_drho_si(),
            Self::InternalEnergy => state.du_drho_si(),
        }
    }

    /// Derivative w.r.t. temperature at constant density.
    fn dt_rho<E: HelmholtzEnergy>(self, state: &State<E>) -> f64 {
        match self {
            Self::Enthalpy => state.dh_dt_si(),
            Self::Entropy => state.cv_si() / state.t(),
            Self::InternalEnergy => state.cv_si(),
        }
    }

    /// Derivative w.r.t. temperature at constant pressure.
    fn dt_p<E: HelmholtzEnergy>(self, state: &State<E>) -> f64 {
        match self {
            Self::Enthalpy => state.cp_si(),
            Self::Entropy => state.cp_si() / state.t(),
            Self::InternalEnergy => {
                let dv_dt = state.dp_dt_si() / (state.rho().powi(2) * state.dp_drho_si());
                state.cp_si() - state.p_si() * dv_dt
            }
        }
    }

    /// Vapor quality if `target` lies between the saturated values.
    fn quality<E: HelmholtzEnergy>(self, vle: &PhaseEquilibrium<E, 2>, target: f64) -> Option<f64> {
        let (x_l, x_v) = (self.value(vle.liquid()), self.value(vle.vapor()));
        ((target - x_l) * (target - x_v) <= 0.0).then(|| (target - x_l) / (x_v - x_l))
    }
}

/// Root of a monotonic function inside `bounds`.
///
/// Without a sign change, the target value is reported as out of range.
fn solve_monotonic<F>(property: &str, target: f64, mut g: F, bounds: [f64; 2]) -> MeosResult<f64>
where
    F: FnMut(f64) -> MeosResult<f64>,
{
    let [lo, hi] = bounds;
    let (g_lo, g_hi) = (g(lo)?, g(hi)?);
    if g_lo == 0.0 {
        return Ok(lo);
    }
    if g_hi == 0.0 {
        return Ok(hi);
    }
    if g_lo.signum() == g_hi.signum() {
        let (a, b) = (g_lo + target, g_hi + target);
        return Err(MeosError::out_of_range(
            property,
            target,
            a.min(b),
            a.max(b),
        ));
    }
    bracketed_secant(property, g, bounds, XTOL)
}

/// # Flash calculations
impl<E: HelmholtzEnergy> State<E> {
    /// Return a new `State` for given temperature and pressure.
    ///
    /// Without an initialization, the stable phase is returned.
    pub fn new_tp(
        eos: &E,
        temperature: Temperature,
        pressure: Pressure,
        density_initialization: Option<DensityInitialization>,
    ) -> MeosResult<Self> {
        let t = temperature.convert_into(KELVIN);
        let p = pressure.convert_into(PASCAL);
        let limits = eos.limits();
        limits.validate_temperature(t)?;
        limits.validate_pressure(p)?;
        let rho = density_iteration(eos, t, p, density_initialization.map(|d| d.into_si()))?;
        Ok(Self::new_unchecked(eos, t, rho))
    }

    /// Return a new `State` for given temperature and molar enthalpy.
    ///
    /// At constant temperature, the enthalpy of a compressed liquid can
    /// coincide with that of a two-phase state. A density initialization
    /// selects the single phase solution, otherwise the two-phase state is returned.
    pub fn new_th(
        eos: &E,
        temperature: Temperature,
        molar_enthalpy: MolarEnergy,
        density_initialization: Option<DensityInitialization>,
    ) -> MeosResult<Self> {
        Self::new_t_caloric(
            eos,
            temperature.convert_into(KELVIN),
            molar_enthalpy.convert_into(JOULE / MOL),
            Caloric::Enthalpy,
            density_initialization.map(|d| d.into_si()),
        )
    }

    /// Return a new `State` for given temperature and molar entropy.
    pub fn new_ts(
        eos: &E,
        temperature: Temperature,
        molar_entropy: MolarEntropy,
        density_initialization: Option<DensityInitialization>,
    ) -> MeosResult<Self> {
        Self::new_t_caloric(
            eos,
            temperature.convert_into(KELVIN),
            molar_entropy.convert_into(JOULE / MOL / KELVIN),
            Caloric::Entropy,
            density_initialization.map(|d| d.into_si()),
        )
    }

    /// Return a new `State` for given temperature and molar internal energy.
    pub fn new_tu(
        eos: &E,
        temperature: Temperature,
        molar_internal_energy: MolarEnergy,
        density_initialization: Option<DensityInitialization>,
    ) -> MeosResult<Self> {
        Self::new_t_caloric(
            eos,
            temperature.convert_into(KELVIN),
            molar_internal_energy.convert_into(JOULE / MOL),
            Caloric::InternalEnergy,
            density_initialization.map(|d| d.into_si()),
        )
    }

    /// Return a new two-phase `State` for given temperature and vapor quality.
    pub fn new_tx(eos: &E, temperature: Temperature, vapor_quality: f64) -> MeosResult<Self> {
        validate_quality(vapor_quality)?;
        let vle = PhaseEquilibrium::pure_t(eos, temperature, None, SolverOptions::default())?;
        Ok(Self::from_two_phase(vle, vapor_quality))
    }

    /// Return a new `State` for given pressure and molar density.
    pub fn new_prho(eos: &E, pressure: Pressure, density: Density) -> MeosResult<Self> {
        let p = pressure.convert_into(PASCAL);
        let rho = density.convert_into(MOL / (METER * METER * METER));
        validate(1.0, rho)?;
        let limits = eos.limits();
        limits.validate_pressure(p)?;

        let bounds = match saturation_at_pressure(eos, p)? {
            Some(vle) => {
                let (rho_v, rho_l) = (vle.vapor().rho(), vle.liquid().rho());
                let t_sat = vle.vapor().t();
                if rho > rho_v && rho < rho_l {
                    let quality = (1.0 / rho - 1.0 / rho_l) / (1.0 / rho_v - 1.0 / rho_l);
                    return Ok(Self::from_two_phase(vle, quality));
                }
                if rho >= rho_l {
                    [limits.t_min, t_sat]
                } else {
                    [t_sat, limits.t_max]
                }
            }
            None => [limits.t_min, limits.t_max],
        };

        // Newton iteration along the isochore, starting from the ideal gas
        let t0 = (p / (rho * eos.gas_constant())).clamp(bounds[0], bounds[1]);
        let f = |t: f64| {
            let s = Self::new_unchecked(eos, t, rho);
            Ok((s.p_si() - p, s.dp_dt_si(), s))
        };
        let t = match newton("new_prho", t0, f, 1e-10, bounds) {
            Ok((t, _)) => t,
            Err(_) => solve_monotonic(
                "pressure",
                p,
                |t| Ok(eos.pressure_si(t, rho) - p),
                bounds,
            )?,
        };
        limits.validate_temperature(t)?;
        Ok(Self::new_unchecked(eos, t, rho))
    }

    /// Return a new `State` for given pressure and molar enthalpy.
    pub fn new_ph(
        eos: &E,
        pressure: Pressure,
        molar_enthalpy: MolarEnergy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_p_caloric(
            eos,
            pressure.convert_into(PASCAL),
            molar_enthalpy.convert_into(JOULE / MOL),
            Caloric::Enthalpy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new `State` for given pressure and molar entropy.
    pub fn new_ps(
        eos: &E,
        pressure: Pressure,
        molar_entropy: MolarEntropy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_p_caloric(
            eos,
            pressure.convert_into(PASCAL),
            molar_entropy.convert_into(JOULE / MOL / KELVIN),
            Caloric::Entropy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new `State` for given pressure and molar internal energy.
    pub fn new_pu(
        eos: &E,
        pressure: Pressure,
        molar_internal_energy: MolarEnergy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_p_caloric(
            eos,
            pressure.convert_into(PASCAL),
            molar_internal_energy.convert_into(JOULE / MOL),
            Caloric::InternalEnergy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new two-phase `State` for given pressure and vapor quality.
    pub fn new_px(eos: &E, pressure: Pressure, vapor_quality: f64) -> MeosResult<Self> {
        validate_quality(vapor_quality)?;
        let vle = PhaseEquilibrium::pure_p(eos, pressure, None, SolverOptions::default())?;
        Ok(Self::from_two_phase(vle, vapor_quality))
    }

    /// Return a new `State` for given molar density and molar enthalpy.
    pub fn new_rhoh(
        eos: &E,
        density: Density,
        molar_enthalpy: MolarEnergy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_rho_caloric(
            eos,
            density.convert_into(MOL / (METER * METER * METER)),
            molar_enthalpy.convert_into(JOULE / MOL),
            Caloric::Enthalpy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new `State` for given molar density and molar entropy.
    pub fn new_rhos(
        eos: &E,
        density: Density,
        molar_entropy: MolarEntropy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_rho_caloric(
            eos,
            density.convert_into(MOL / (METER * METER * METER)),
            molar_entropy.convert_into(JOULE / MOL / KELVIN),
            Caloric::Entropy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new `State` for given molar density and molar internal energy.
    pub fn new_rhou(
        eos: &E,
        density: Density,
        molar_internal_energy: MolarEnergy,
        initial_temperature: Option<Temperature>,
    ) -> MeosResult<Self> {
        Self::new_rho_caloric(
            eos,
            density.convert_into(MOL / (METER * METER * METER)),
            molar_internal_energy.convert_into(JOULE / MOL),
            Caloric::InternalEnergy,
            initial_temperature.map(|t| t.convert_into(KELVIN)),
        )
    }

    /// Return a new `State` for given molar enthalpy and molar entropy.
    ///
    /// A Newton iteration in temperature and density is tried first. If it
    /// fails or ends inside the vapor-liquid dome, the isentrope is
    /// followed in temperature until the enthalpy is matched.
    pub fn new_hs(
        eos: &E,
        molar_enthalpy: MolarEnergy,
        molar_entropy: MolarEntropy,
        initial_temperature: Option<Temperature>,
        density_initialization: Option<DensityInitialization>,
    ) -> MeosResult<Self> {
        let h = molar_enthalpy.convert_into(JOULE / MOL);
        let s = molar_entropy.convert_into(JOULE / MOL / KELVIN);
        let limits = eos.limits();
        let cc = eos.critical_constants();
        let t0 = initial_temperature
            .map(|t| t.convert_into(KELVIN))
            .unwrap_or(cc.temperature);
        let rho0 = match density_initialization.map(|d| d.into_si()) {
            Some(DensityInitialization::InitialDensity(rho)) => rho,
            Some(DensityInitialization::Liquid) => 0.9 * eos.max_density(),
            Some(DensityInitialization::Vapor) => 0.01 * cc.density,
            None => cc.density,
        };

        match Self::hs_newton(eos, h, s, t0, rho0, SolverOptions::default()) {
            Ok(state) if state.two_phase().is_none() => {
                limits.validate_pressure(state.p_si())?;
                return Ok(state);
            }
            _ => (),
        }

        // follow the isentrope
        let g = |t: f64| {
            let state = Self::new_t_caloric(eos, t, s, Caloric::Entropy, None)?;
            Ok(state.h_si() - h)
        };
        let grid = geomspace(limits.t_min, limits.t_max, SCAN_POINTS);
        let bracket = find_brackets(&grid, g).into_iter().next().ok_or_else(|| {
            MeosError::UndeterminedState(format!("no state with h = {h} J/mol and s = {s} J/mol/K"))
        })?;
        let t = bracketed_secant("new_hs", g, bracket, XTOL)?;
        let state = Self::new_t_caloric(eos, t, s, Caloric::Entropy, None)?;
        limits.validate_pressure(state.p_si())?;
        Ok(state)
    }
}

impl<E: HelmholtzEnergy> State<E> {
    fn new_t_caloric(
        eos: &E,
        t: f64,
        target: f64,
        caloric: Caloric,
        density_initialization: Option<DensityInitialization<f64>>,
    ) -> MeosResult<Self> {
        let limits = eos.limits();
        limits.validate_temperature(t)?;
        let rho_max = eos.max_density();
        let rho_min = 1e-10 * rho_max;

        let vle = if t < eos.critical_constants().temperature {
            Some(PhaseEquilibrium::pure_t(
                eos,
                t * KELVIN,
                None,
                SolverOptions::default(),
            )?)
        } else {
            None
        };

        let intervals = match &vle {
            Some(vle) => {
                let (rho_v, rho_l) = (vle.vapor().rho(), vle.liquid().rho());
                let vapor = ([rho_min, rho_v], 0.5 * rho_v);
                let liquid = ([rho_l, rho_max], rho_l);
                let liquid_first = match density_initialization {
                    Some(DensityInitialization::Liquid) => true,
                    Some(DensityInitialization::Vapor) => false,
                    Some(DensityInitialization::InitialDensity(rho)) => rho >= rho_l,
                    None => {
                        if let Some(quality) = caloric.quality(vle, target) {
                            return Ok(Self::from_two_phase(vle.clone(), quality));
                        }
                        (target - caloric.value(vle.liquid())).abs()
                            < (target - caloric.value(vle.vapor())).abs()
                    }
                };
                if liquid_first {
                    vec![liquid, vapor]
                } else {
                    vec![vapor, liquid]
                }
            }
            None => vec![([rho_min, rho_max], eos.critical_constants().density)],
        };

        for (k, (bounds, seed)) in intervals.into_iter().enumerate() {
            let seed = match density_initialization {
                Some(DensityInitialization::InitialDensity(rho))
                    if rho >= bounds[0] && rho <= bounds[1] =>
                {
                    rho
                }
                _ => seed,
            };
            if let Ok(state) = Self::solve_density(eos, t, target, caloric, bounds, seed) {
                return Ok(state);
            }
            // the preferred side has no solution, check for a two-phase state
            if let (0, Some(vle)) = (k, &vle) {
                if let Some(quality) = caloric.quality(vle, target) {
                    return Ok(Self::from_two_phase(vle.clone(), quality));
                }
            }
        }
        Err(MeosError::UndeterminedState(format!(
            "no state with T = {t} K and {} = {target}",
            caloric.name()
        )))
    }

    /// Newton iteration in density at constant temperature with a bracketed fallback.
    fn solve_density(
        eos: &E,
        t: f64,
        target: f64,
        caloric: Caloric,
        bounds: [f64; 2],
        seed: f64,
    ) -> MeosResult<Self> {
        let p_max = eos.limits().p_max;
        let acceptable = |s: &Self| {
            let p = s.p_si();
            s.dp_drho_si() > 0.0 && p > 0.0 && p <= p_max
        };

        let f = |rho: f64| {
            let s = Self::new_unchecked(eos, t, rho);
            Ok((caloric.value(&s) - target, caloric.drho(&s), s))
        };
        if let Ok((rho, state)) = newton(caloric.name(), seed, f, 1e-10, bounds) {
            if rho >= bounds[0] && rho <= bounds[1] && acceptable(&state) {
                return Ok(state);
            }
        }

        let g = |rho: f64| Ok(caloric.value(&Self::new_unchecked(eos, t, rho)) - target);
        let grid = geomspace(bounds[0], bounds[1], SCAN_POINTS);
        for bracket in find_brackets(&grid, g) {
            let rho = bracketed_secant(caloric.name(), g, bracket, XTOL)?;
            let state = Self::new_unchecked(eos, t, rho);
            if acceptable(&state) {
                return Ok(state);
            }
        }
        Err(MeosError::UndeterminedState(format!(
            "no density found for T = {t} K and {} = {target}",
            caloric.name()
        )))
    }

    fn new_p_caloric(
        eos: &E,
        p: f64,
        target: f64,
        caloric: Caloric,
        initial_temperature: Option<f64>,
    ) -> MeosResult<Self> {
        let limits = eos.limits();
        limits.validate_pressure(p)?;

        let (bounds, density) = match saturation_at_pressure(eos, p)? {
            Some(vle) => {
                if let Some(quality) = caloric.quality(&vle, target) {
                    return Ok(Self::from_two_phase(vle, quality));
                }
                let t_sat = vle.vapor().t();
                if target < caloric.value(vle.liquid()) {
                    let rho = vle.liquid().rho();
                    ([limits.t_min, t_sat], Some(DensityInitialization::InitialDensity(rho)))
                } else {
                    let rho = vle.vapor().rho();
                    ([t_sat, limits.t_max], Some(DensityInitialization::InitialDensity(rho)))
                }
            }
            None => ([limits.t_min, limits.t_max], None),
        };

        // Newton iteration in temperature with a density iteration in every step
        let t0 = match (initial_temperature, density) {
            (Some(t), _) => t.clamp(bounds[0], bounds[1]),
            (None, Some(_)) if bounds[1] < limits.t_max => bounds[1],
            (None, Some(_)) => bounds[0],
            (None, None) => eos.critical_constants().temperature,
        };
        let mut rho_init = density;
        let f = |t: f64| {
            let rho = density_iteration(eos, t, p, rho_init)?;
            if rho_init.is_some() {
                rho_init = Some(DensityInitialization::InitialDensity(rho));
            }
            let s = Self::new_unchecked(eos, t, rho);
            Ok((caloric.value(&s) - target, caloric.dt_p(&s), s))
        };
        if let Ok((_, state)) = newton(caloric.name(), t0, f, 1e-10, bounds) {
            return Ok(state);
        }

        let g = |t: f64| {
            let rho = density_iteration(eos, t, p, density)?;
            Ok(caloric.value(&Self::new_unchecked(eos, t, rho)) - target)
        };
        let t = solve_monotonic(caloric.name(), target, g, bounds)?;
        let rho = density_iteration(eos, t, p, density)?;
        Ok(Self::new_unchecked(eos, t, rho))
    }

    fn new_rho_caloric(
        eos: &E,
        rho: f64,
        target: f64,
        caloric: Caloric,
        initial_temperature: Option<f64>,
    ) -> MeosResult<Self> {
        validate(1.0, rho)?;
        let limits = eos.limits();
        let tc = eos.critical_constants().temperature;
        let t0 = initial_temperature
            .unwrap_or(tc)
            .clamp(limits.t_min, limits.t_max);

        // single phase Newton iteration along the isochore
        let f = |t: f64| {
            let s = Self::new_unchecked(eos, t, rho);
            Ok((caloric.value(&s) - target, caloric.dt_rho(&s), s))
        };
        let upper = match newton(caloric.name(), t0, f, 1e-10, [limits.t_min, limits.t_max]) {
            Ok((t, _)) => {
                let state = Self::resolve_two_phase(eos, t, rho)?;
                if state.two_phase().is_none() {
                    limits.validate_pressure(state.p_si())?;
                    return Ok(state);
                }
                tc
            }
            Err(_) => limits.t_max,
        };

        // the property is monotonic in temperature along the isochore, also inside the dome
        let g = |t: f64| Ok(caloric.value(&Self::resolve_two_phase(eos, t, rho)?) - target);
        let t = solve_monotonic(caloric.name(), target, g, [limits.t_min, upper])?;
        let state = Self::resolve_two_phase(eos, t, rho)?;
        limits.validate_pressure(state.p_si())?;
        Ok(state)
    }

    /// Newton iteration in $(T,\ln\rho)$ for given molar enthalpy and entropy.
    ///
    /// Results inside the vapor-liquid dome are returned as two-phase states.
    fn hs_newton(
        eos: &E,
        h: f64,
        s: f64,
        t0: f64,
        rho0: f64,
        options: SolverOptions,
    ) -> MeosResult<Self> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_HS, TOL_HS);
        let limits = eos.limits();
        let rho_max = eos.max_density();
        let (mut t, mut rho) = (t0, rho0);

        log_iter!(
            verbosity,
            " iter |    residual    |  temperature  |    density     "
        );
        log_iter!(verbosity, "{:-<56}", "");
        for i in 1..=max_iter {
            let state = Self::new_unchecked(eos, t, rho);
            let f = Vector2::new(state.h_si() - h, state.s_si() - s);
            let jacobian = Matrix2::new(
                state.dh_dt_si(),
                state.dh_drho_si() * rho,
                state.cv_si() / t,
                state.ds_drho_si() * rho,
            );
            let dx = -jacobian
                .try_inverse()
                .ok_or_else(|| MeosError::IterationFailed("new_hs: singular Jacobian".into()))?
                * f;
            if !dx[0].is_finite() || !dx[1].is_finite() {
                return Err(MeosError::IterationFailed("new_hs".into()));
            }

            // limit the steps and keep the iterate inside the range of the model
            let dt = dx[0].clamp(-0.25 * t, 0.25 * t);
            let dln_rho = dx[1].clamp(-1.0, 1.0);
            t = (t + dt).clamp(0.5 * limits.t_min, limits.t_max);
            rho = (rho * dln_rho.exp()).min(rho_max);

            let res = (dt / t).abs() + dln_rho.abs();
            log_iter!(verbosity, " {:4} | {:14.8e} | {:13.8} | {:14.8}", i, res, t, rho);
            if res < tol {
                limits.validate_temperature(t)?;
                let state = Self::new_unchecked(eos, t, rho);
                if !(state.dp_drho_si() > 0.0) {
                    return Err(MeosError::IterationFailed(
                        "new_hs: mechanically unstable solution".into(),
                    ));
                }
                log_result!(verbosity, "State::new_hs: converged in {} step(s)\n", i);
                return Self::resolve_two_phase(eos, t, rho);
            }
        }
        Err(MeosError::not_converged("new_hs", max_iter, t))
    }
}

fn validate_quality(vapor_quality: f64) -> MeosResult<()> {
    if !(0.0..=1.0).contains(&vapor_quality) {
        return Err(MeosError::out_of_range(
            "vapor quality",
            vapor_quality,
            0.0,
            1.0,
        ));
    }
    Ok(())
}

/// Saturation state at the given pressure.
///
/// `None` if the pressure is supercritical or below the vapor pressure at the
/// minimum temperature, i.e., if no phase boundary is crossed at this pressure.
fn saturation_at_pressure<E: HelmholtzEnergy>(
    eos: &E,
    p: f64,
) -> MeosResult<Option<PhaseEquilibrium<E, 2>>> {
    if p >= eos.critical_pressure_si() {
        return Ok(None);
    }
    match PhaseEquilibrium::pure_p(eos, p * PASCAL, None, SolverOptions::default()) {
        Ok(vle) => Ok(Some(vle)),
        Err(MeosError::OutOfRange { .. }) | Err(MeosError::SuperCritical) => Ok(None),
        Err(e) => Err(e),
    }
}
