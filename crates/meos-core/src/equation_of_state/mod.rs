use crate::errors::{MeosError, MeosResult};
use num_dual::DualNum;
use std::ops::Deref;

mod derivatives;
mod transport;
pub use derivatives::{HelmholtzDerivatives, ReducedVariables, ThirdDerivatives};
pub use transport::Transport;

/// Critical constants of an equation of state in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CriticalConstants {
    /// Critical temperature in K
    pub temperature: f64,
    /// Critical density in mol/m³
    pub density: f64,
    /// Critical pressure in Pa
    pub pressure: f64,
}

/// Range of validity of an equation of state in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Minimum temperature in K (usually the triple point)
    pub t_min: f64,
    /// Maximum temperature in K
    pub t_max: f64,
    /// Maximum pressure in Pa
    pub p_max: f64,
    /// Maximum density in mol/m³
    pub rho_max: f64,
}

impl Limits {
    pub fn validate_temperature(&self, temperature: f64) -> MeosResult<()> {
        if !temperature.is_finite() || temperature < self.t_min || temperature > self.t_max {
            return Err(MeosError::out_of_range(
                "temperature",
                temperature,
                self.t_min,
                self.t_max,
            ));
        }
        Ok(())
    }

    pub fn validate_pressure(&self, pressure: f64) -> MeosResult<()> {
        if !pressure.is_finite() || pressure <= 0.0 || pressure > self.p_max {
            return Err(MeosError::out_of_range(
                "pressure", pressure, 0.0, self.p_max,
            ));
        }
        Ok(())
    }
}

/// Estimate of a saturation state used to initialize solvers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaturationEstimate {
    /// Vapor pressure in Pa
    pub pressure: f64,
    /// Saturated liquid density in mol/m³
    pub liquid_density: f64,
    /// Saturated vapor density in mol/m³
    pub vapor_density: f64,
}

/// A pure fluid described by a reduced Helmholtz energy
/// $\alpha(\delta,\tau)=\alpha^0(\delta,\tau)+\alpha^\mathrm{r}(\delta,\tau)$.
///
/// All dimensioned values are in SI units (K, mol/m³, Pa, kg/mol).
///
/// `HelmholtzEnergy` is automatically implemented for all pointer
/// types that deref to the struct implementing `HelmholtzEnergyDyn` and
/// are `Clone` (i.e., `Rc<T>`, `Arc<T>`, `&T`, ...).
pub trait HelmholtzEnergyDyn {
    /// Temperature and density used to define $\tau$ and $\delta$.
    fn reducing_point(&self) -> (f64, f64);

    fn critical_constants(&self) -> CriticalConstants;

    /// Molar gas constant of the formulation in J/(mol K).
    fn gas_constant(&self) -> f64;

    /// Molar weight in kg/mol.
    fn molar_weight(&self) -> f64;

    fn limits(&self) -> Limits;

    /// Residual reduced Helmholtz energy $\alpha^\mathrm{r}$.
    fn residual<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D;

    /// Ideal gas reduced Helmholtz energy $\alpha^0$.
    fn ideal_gas<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D;

    /// Estimate of the saturation state at the given temperature.
    fn saturation_estimate(&self, _temperature: f64) -> Option<SaturationEstimate> {
        None
    }

    /// Estimate of the saturation temperature at the given pressure.
    fn saturation_temperature_estimate(&self, _pressure: f64) -> Option<f64> {
        None
    }
}

impl<C: Deref<Target = T> + Clone, T: HelmholtzEnergyDyn> HelmholtzEnergy for C {
    fn reducing_point(&self) -> (f64, f64) {
        T::reducing_point(self)
    }
    fn critical_constants(&self) -> CriticalConstants {
        T::critical_constants(self)
    }
    fn gas_constant(&self) -> f64 {
        T::gas_constant(self)
    }
    fn molar_weight(&self) -> f64 {
        T::molar_weight(self)
    }
    fn limits(&self) -> Limits {
        T::limits(self)
    }
    fn residual<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        T::residual(self, delta, tau)
    }
    fn ideal_gas<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        T::ideal_gas(self, delta, tau)
    }
    fn saturation_estimate(&self, temperature: f64) -> Option<SaturationEstimate> {
        T::saturation_estimate(self, temperature)
    }
    fn saturation_temperature_estimate(&self, pressure: f64) -> Option<f64> {
        T::saturation_temperature_estimate(self, pressure)
    }
}

/// A Helmholtz energy model handle that can be stored in states.
pub trait HelmholtzEnergy: Clone {
    fn reducing_point(&self) -> (f64, f64);
    fn critical_constants(&self) -> CriticalConstants;
    fn gas_constant(&self) -> f64;
    fn molar_weight(&self) -> f64;
    fn limits(&self) -> Limits;
    fn residual<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D;
    fn ideal_gas<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D;
    fn saturation_estimate(&self, temperature: f64) -> Option<SaturationEstimate>;
    fn saturation_temperature_estimate(&self, pressure: f64) -> Option<f64>;

    /// Return the maximum density in mol/m³.
    ///
    /// This value is used as an estimate for a liquid phase for phase
    /// equilibria and other iterations.
    fn max_density(&self) -> f64 {
        self.limits().rho_max
    }

    fn reduced_variables(&self, temperature: f64, density: f64) -> ReducedVariables {
        let (t_red, rho_red) = self.reducing_point();
        ReducedVariables::new(temperature, density, t_red, rho_red)
    }

    fn residual_derivatives(&self, rv: ReducedVariables) -> HelmholtzDerivatives {
        HelmholtzDerivatives::from_fn(|d, t| self.residual(d, t), rv)
    }

    fn ideal_gas_derivatives(&self, rv: ReducedVariables) -> HelmholtzDerivatives {
        HelmholtzDerivatives::from_fn(|d, t| self.ideal_gas(d, t), rv)
    }

    fn residual_third_derivatives(&self, rv: ReducedVariables) -> ThirdDerivatives {
        ThirdDerivatives::from_fn(|d, t| self.residual(d, t), rv)
    }

    // The following methods are used in solvers and work on plain SI values.

    /// calculates p
    fn pressure_si(&self, temperature: f64, density: f64) -> f64 {
        self.p_dpdrho(temperature, density).0
    }

    /// calculates p, dp_drho
    fn p_dpdrho(&self, temperature: f64, density: f64) -> (f64, f64) {
        let rv = self.reduced_variables(temperature, density);
        let r = self.residual_derivatives(rv);
        let rt = self.gas_constant() * temperature;
        let d = rv.delta;
        (
            density * rt * (1.0 + d * r.a_d),
            rt * (1.0 + 2.0 * d * r.a_d + d * d * r.a_dd),
        )
    }

    /// calculates p, dp_drho, d2p_drho2
    fn p_dpdrho_d2pdrho2(&self, temperature: f64, density: f64) -> (f64, f64, f64) {
        let rv = self.reduced_variables(temperature, density);
        let r = self.residual_derivatives(rv);
        let r3 = self.residual_third_derivatives(rv);
        let rt = self.gas_constant() * temperature;
        let d = rv.delta;
        (
            density * rt * (1.0 + d * r.a_d),
            rt * (1.0 + 2.0 * d * r.a_d + d * d * r.a_dd),
            rt / density * (2.0 * d * r.a_d + 4.0 * d * d * r.a_dd + d * d * d * r3.a_ddd),
        )
    }

    /// Pressure of the equation of state at the critical point in Pa.
    ///
    /// Can deviate slightly from the tabulated critical pressure.
    fn critical_pressure_si(&self) -> f64 {
        let cc = self.critical_constants();
        self.pressure_si(cc.temperature, cc.density)
    }

    /// Chemical potential up to a function of temperature, in J/mol.
    ///
    /// Only differences at equal temperature are meaningful.
    fn chemical_potential_si(&self, temperature: f64, density: f64) -> f64 {
        let rv = self.reduced_variables(temperature, density);
        let r = self.residual_derivatives(rv);
        self.gas_constant() * temperature * (r.a + rv.delta * r.a_d + density.ln())
    }

    /// Second virial coefficient $B(T)$ in m³/mol.
    fn second_virial_coefficient_si(&self, temperature: f64) -> f64 {
        let (t_red, rho_red) = self.reducing_point();
        let rv = ReducedVariables {
            delta: 0.0,
            tau: t_red / temperature,
        };
        self.residual_derivatives(rv).a_d / rho_red
    }
}
