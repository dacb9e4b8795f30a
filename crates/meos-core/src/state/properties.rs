use super::{Contributions, State};
use crate::equation_of_state::{
    HelmholtzDerivatives, HelmholtzEnergy, ReducedVariables, ThirdDerivatives, Transport,
};
use crate::errors::{MeosError, MeosResult};
use quantity::*;
use std::ops::{Div, Neg, Sub};

type InvP = Quantity<f64, <_Pressure as Neg>::Output>;
type InvT = Quantity<f64, <_Temperature as Neg>::Output>;
type POverT = Quantity<f64, <_Pressure as Sub<_Temperature>>::Output>;
type DpDrho = <Pressure as Div<Density>>::Output;
type D2pDrho2 = <DpDrho as Div<Density>>::Output;
type JouleThomson = <Temperature as Div<Pressure>>::Output;
type Diffusivity = <Viscosity as Div<MassDensity>>::Output;

impl<E: HelmholtzEnergy> State<E> {
    fn reduced_variables(&self) -> ReducedVariables {
        self.eos.reduced_variables(self.t, self.rho)
    }

    fn residual(&self) -> &HelmholtzDerivatives {
        self.cache
            .residual
            .get_or_init(|| self.eos.residual_derivatives(self.reduced_variables()))
    }

    fn ideal_gas(&self) -> &HelmholtzDerivatives {
        self.cache
            .ideal_gas
            .get_or_init(|| self.eos.ideal_gas_derivatives(self.reduced_variables()))
    }

    fn third(&self) -> &ThirdDerivatives {
        self.cache
            .third
            .get_or_init(|| self.eos.residual_third_derivatives(self.reduced_variables()))
    }

    fn contributions<I: FnOnce() -> f64, R: FnOnce() -> f64>(
        ideal_gas: I,
        residual: R,
        contributions: Contributions,
    ) -> f64 {
        match contributions {
            Contributions::IdealGas => ideal_gas(),
            Contributions::Residual => residual(),
            Contributions::Total => ideal_gas() + residual(),
        }
    }

    /// Quality weighted value for two-phase states.
    fn weighted<F: Fn(&Self) -> f64>(&self, f: F) -> f64 {
        match self.two_phase() {
            Some(tp) => {
                (1.0 - tp.quality) * f(tp.vle.liquid()) + tp.quality * f(tp.vle.vapor())
            }
            None => f(self),
        }
    }

    /// Derivative properties are undefined inside the two-phase region.
    fn single_phase<F: FnOnce(&Self) -> f64>(&self, f: F) -> f64 {
        if self.two_phase.is_some() {
            f64::NAN
        } else {
            f(self)
        }
    }

    fn rt(&self) -> f64 {
        self.eos.gas_constant() * self.t
    }

    fn delta_tau(&self) -> (f64, f64) {
        let rv = self.reduced_variables();
        (rv.delta, rv.tau)
    }

    pub(crate) fn p_si_contributions(&self, contributions: Contributions) -> f64 {
        if let Some(tp) = self.two_phase() {
            return tp.vle.vapor().p_si_contributions(contributions);
        }
        let (d, _) = self.delta_tau();
        let r = self.residual();
        let rho_rt = self.rho * self.rt();
        Self::contributions(|| rho_rt, || rho_rt * d * r.a_d, contributions)
    }

    pub(crate) fn p_si(&self) -> f64 {
        self.p_si_contributions(Contributions::Total)
    }

    fn u_single(&self, contributions: Contributions) -> f64 {
        let (_, t) = self.delta_tau();
        let rt = self.rt();
        Self::contributions(
            || rt * t * self.ideal_gas().a_t,
            || rt * t * self.residual().a_t,
            contributions,
        )
    }

    fn h_single(&self, contributions: Contributions) -> f64 {
        let (d, t) = self.delta_tau();
        let rt = self.rt();
        Self::contributions(
            || rt * (1.0 + t * self.ideal_gas().a_t),
            || rt * (t * self.residual().a_t + d * self.residual().a_d),
            contributions,
        )
    }

    fn s_single(&self, contributions: Contributions) -> f64 {
        let (_, t) = self.delta_tau();
        let r = self.eos.gas_constant();
        Self::contributions(
            || r * (t * self.ideal_gas().a_t - self.ideal_gas().a),
            || r * (t * self.residual().a_t - self.residual().a),
            contributions,
        )
    }

    fn a_single(&self, contributions: Contributions) -> f64 {
        let rt = self.rt();
        Self::contributions(
            || rt * self.ideal_gas().a,
            || rt * self.residual().a,
            contributions,
        )
    }

    fn g_single(&self, contributions: Contributions) -> f64 {
        let (d, _) = self.delta_tau();
        let rt = self.rt();
        Self::contributions(
            || rt * (1.0 + self.ideal_gas().a),
            || rt * (self.residual().a + d * self.residual().a_d),
            contributions,
        )
    }

    fn cv_single(&self, contributions: Contributions) -> f64 {
        let (_, t) = self.delta_tau();
        let r = self.eos.gas_constant();
        Self::contributions(
            || -r * t * t * self.ideal_gas().a_tt,
            || -r * t * t * self.residual().a_tt,
            contributions,
        )
    }

    fn cp_single(&self, contributions: Contributions) -> f64 {
        let (d, t) = self.delta_tau();
        let r = self.eos.gas_constant();
        let res = self.residual();
        let cp0 = self.cv_single(Contributions::IdealGas) + r;
        let cp = || {
            self.cv_single(Contributions::Total)
                + r * (1.0 + d * res.a_d - d * t * res.a_dt).powi(2)
                    / (1.0 + 2.0 * d * res.a_d + d * d * res.a_dd)
        };
        match contributions {
            Contributions::IdealGas => cp0,
            Contributions::Residual => cp() - cp0,
            Contributions::Total => cp(),
        }
    }

    fn dp_drho_single(&self, contributions: Contributions) -> f64 {
        let (d, _) = self.delta_tau();
        let r = self.residual();
        let rt = self.rt();
        Self::contributions(
            || rt,
            || rt * (2.0 * d * r.a_d + d * d * r.a_dd),
            contributions,
        )
    }

    fn dp_dt_single(&self, contributions: Contributions) -> f64 {
        let (d, t) = self.delta_tau();
        let r = self.residual();
        let rho_r = self.rho * self.eos.gas_constant();
        Self::contributions(
            || rho_r,
            || rho_r * (d * r.a_d - d * t * r.a_dt),
            contributions,
        )
    }

    fn d2p_drho2_single(&self) -> f64 {
        let (d, _) = self.delta_tau();
        let r = self.residual();
        let r3 = self.third();
        self.rt() / self.rho
            * (2.0 * d * r.a_d + 4.0 * d * d * r.a_dd + d * d * d * r3.a_ddd)
    }

    fn d2p_drhodt_single(&self) -> f64 {
        let (d, t) = self.delta_tau();
        let r = self.residual();
        let r3 = self.third();
        self.eos.gas_constant()
            * (1.0 + 2.0 * d * r.a_d + d * d * r.a_dd
                - 2.0 * d * t * r.a_dt
                - d * d * t * r3.a_ddt)
    }

    pub(crate) fn u_si(&self) -> f64 {
        self.weighted(|s| s.u_single(Contributions::Total))
    }

    pub(crate) fn h_si(&self) -> f64 {
        self.weighted(|s| s.h_single(Contributions::Total))
    }

    pub(crate) fn s_si(&self) -> f64 {
        self.weighted(|s| s.s_single(Contributions::Total))
    }

    pub(crate) fn residual_entropy_si(&self) -> f64 {
        self.s_single(Contributions::Residual)
    }

    pub(crate) fn residual_helmholtz_energy_si(&self) -> f64 {
        self.a_single(Contributions::Residual)
    }

    pub(crate) fn cv_si(&self) -> f64 {
        self.single_phase(|s| s.cv_single(Contributions::Total))
    }

    pub(crate) fn cp_si(&self) -> f64 {
        self.single_phase(|s| s.cp_single(Contributions::Total))
    }

    pub(crate) fn dp_drho_si(&self) -> f64 {
        self.single_phase(|s| s.dp_drho_single(Contributions::Total))
    }

    pub(crate) fn dp_dt_si(&self) -> f64 {
        self.single_phase(|s| s.dp_dt_single(Contributions::Total))
    }

    /// Temperature derivative of the molar enthalpy at constant density in J/(mol K).
    pub(crate) fn dh_dt_si(&self) -> f64 {
        let (d, t) = self.delta_tau();
        let (i, r) = (self.ideal_gas(), self.residual());
        self.eos.gas_constant()
            * (-t * t * (i.a_tt + r.a_tt) + 1.0 + d * r.a_d - d * t * r.a_dt)
    }

    /// Density derivatives of h, s and u at constant temperature.
    pub(crate) fn dh_drho_si(&self) -> f64 {
        let (d, t) = self.delta_tau();
        let r = self.residual();
        self.rt() / self.rho * (d * t * r.a_dt + d * r.a_d + d * d * r.a_dd)
    }

    pub(crate) fn ds_drho_si(&self) -> f64 {
        let (d, t) = self.delta_tau();
        let r = self.residual();
        -self.eos.gas_constant() / self.rho * (1.0 + d * r.a_d - d * t * r.a_dt)
    }

    pub(crate) fn du_drho_si(&self) -> f64 {
        let (d, t) = self.delta_tau();
        self.rt() / self.rho * d * t * self.residual().a_dt
    }
}

/// # State properties
impl<E: HelmholtzEnergy> State<E> {
    /// Pressure: $p=\rho RT\left(1+\delta\alpha^\mathrm{r}_\delta\right)$
    ///
    /// For two-phase states, this is the saturation pressure.
    pub fn pressure(&self, contributions: Contributions) -> Pressure {
        Pressure::new(self.p_si_contributions(contributions))
    }

    /// Compressibility factor: $Z=\frac{p}{\rho RT}$
    pub fn compressibility(&self, contributions: Contributions) -> f64 {
        self.p_si_contributions(contributions) / (self.rho * self.rt())
    }

    /// Partial derivative of pressure w.r.t. density: $\left(\frac{\partial p}{\partial \rho}\right)_T$
    pub fn dp_drho(&self, contributions: Contributions) -> DpDrho {
        DpDrho::new(self.single_phase(|s| s.dp_drho_single(contributions)))
    }

    /// Partial derivative of pressure w.r.t. temperature: $\left(\frac{\partial p}{\partial T}\right)_\rho$
    pub fn dp_dt(&self, contributions: Contributions) -> POverT {
        POverT::new(self.single_phase(|s| s.dp_dt_single(contributions)))
    }

    /// Second partial derivative of pressure w.r.t. density: $\left(\frac{\partial^2 p}{\partial \rho^2}\right)_T$
    pub fn d2p_drho2(&self) -> D2pDrho2 {
        D2pDrho2::new(self.single_phase(|s| s.d2p_drho2_single()))
    }

    /// Phase identification parameter:
    /// $\Pi=2-\rho\left[\frac{\partial^2p/\partial\rho\partial T}{\partial p/\partial T}-\frac{\partial^2p/\partial\rho^2}{\partial p/\partial\rho}\right]$
    ///
    /// $\Pi>1$ indicates a liquid-like, $\Pi<1$ a gas-like state.
    pub fn phase_identification_parameter(&self) -> f64 {
        self.single_phase(|s| {
            2.0 - s.rho
                * (s.d2p_drhodt_single() / s.dp_dt_single(Contributions::Total)
                    - s.d2p_drho2_single() / s.dp_drho_single(Contributions::Total))
        })
    }

    /// Molar internal energy: $u=RT\tau\alpha_\tau$
    pub fn molar_internal_energy(&self, contributions: Contributions) -> MolarEnergy {
        MolarEnergy::new(self.weighted(|s| s.u_single(contributions)))
    }

    /// Molar enthalpy: $h=RT\left(1+\tau\alpha_\tau+\delta\alpha^\mathrm{r}_\delta\right)$
    pub fn molar_enthalpy(&self, contributions: Contributions) -> MolarEnergy {
        MolarEnergy::new(self.weighted(|s| s.h_single(contributions)))
    }

    /// Molar entropy: $s=R\left(\tau\alpha_\tau-\alpha\right)$
    pub fn molar_entropy(&self, contributions: Contributions) -> MolarEntropy {
        MolarEntropy::new(self.weighted(|s| s.s_single(contributions)))
    }

    /// Molar Helmholtz energy: $a=RT\alpha$
    pub fn molar_helmholtz_energy(&self, contributions: Contributions) -> MolarEnergy {
        MolarEnergy::new(self.weighted(|s| s.a_single(contributions)))
    }

    /// Molar Gibbs energy: $g=RT\left(1+\alpha+\delta\alpha^\mathrm{r}_\delta\right)$
    pub fn molar_gibbs_energy(&self, contributions: Contributions) -> MolarEnergy {
        MolarEnergy::new(self.weighted(|s| s.g_single(contributions)))
    }

    /// Molar isochoric heat capacity: $c_v=\left(\frac{\partial u}{\partial T}\right)_v$
    pub fn molar_isochoric_heat_capacity(&self, contributions: Contributions) -> MolarEntropy {
        MolarEntropy::new(self.single_phase(|s| s.cv_single(contributions)))
    }

    /// Molar isobaric heat capacity: $c_p=\left(\frac{\partial h}{\partial T}\right)_p$
    pub fn molar_isobaric_heat_capacity(&self, contributions: Contributions) -> MolarEntropy {
        MolarEntropy::new(self.single_phase(|s| s.cp_single(contributions)))
    }

    /// Logarithm of the fugacity coefficient: $\ln\varphi=\alpha^\mathrm{r}+\delta\alpha^\mathrm{r}_\delta-\ln\left(1+\delta\alpha^\mathrm{r}_\delta\right)$
    pub fn ln_phi(&self) -> f64 {
        self.single_phase(|s| {
            let (d, _) = s.delta_tau();
            let r = s.residual();
            r.a + d * r.a_d - (1.0 + d * r.a_d).ln()
        })
    }

    /// Second virial coefficient $B(T)$
    pub fn second_virial_coefficient(&self) -> MolarVolume {
        MolarVolume::new(self.eos.second_virial_coefficient_si(self.t))
    }

    /// Joule Thomson coefficient: $\mu_{JT}=\left(\frac{\partial T}{\partial p}\right)_h$
    pub fn joule_thomson(&self) -> JouleThomson {
        JouleThomson::new(self.single_phase(|s| {
            let c = Contributions::Total;
            let dv_dt = s.dp_dt_single(c) / (s.rho * s.rho * s.dp_drho_single(c));
            (s.t * dv_dt - 1.0 / s.rho) / s.cp_single(c)
        }))
    }

    /// Isothermal compressibility: $\kappa_T=\frac{1}{\rho}\left(\frac{\partial \rho}{\partial p}\right)_T$
    pub fn isothermal_compressibility(&self) -> InvP {
        InvP::new(self.single_phase(|s| {
            1.0 / (s.rho * s.dp_drho_single(Contributions::Total))
        }))
    }

    /// Isentropic compressibility: $\kappa_s=\frac{c_v}{c_p}\kappa_T$
    pub fn isentropic_compressibility(&self) -> InvP {
        InvP::new(self.single_phase(|s| {
            let c = Contributions::Total;
            s.cv_single(c) / (s.cp_single(c) * s.rho * s.dp_drho_single(c))
        }))
    }

    /// Thermal expansivity: $\alpha_p=-\frac{1}{\rho}\left(\frac{\partial \rho}{\partial T}\right)_p$
    pub fn thermal_expansivity(&self) -> InvT {
        InvT::new(self.single_phase(|s| {
            let c = Contributions::Total;
            s.dp_dt_single(c) / (s.rho * s.dp_drho_single(c))
        }))
    }
}

/// # Mass specific state properties
impl<E: HelmholtzEnergy> State<E> {
    /// Molar weight $M$
    pub fn molar_weight(&self) -> MolarWeight {
        MolarWeight::new(self.eos.molar_weight())
    }

    /// Mass density $\rho^{(m)}=\rho M$
    pub fn mass_density(&self) -> MassDensity {
        MassDensity::new(self.rho * self.eos.molar_weight())
    }

    /// Specific internal energy: $u^{(m)}=\frac{u}{M}$
    pub fn specific_internal_energy(&self, contributions: Contributions) -> SpecificEnergy {
        self.molar_internal_energy(contributions) / self.molar_weight()
    }

    /// Specific enthalpy: $h^{(m)}=\frac{h}{M}$
    pub fn specific_enthalpy(&self, contributions: Contributions) -> SpecificEnergy {
        self.molar_enthalpy(contributions) / self.molar_weight()
    }

    /// Specific entropy: $s^{(m)}=\frac{s}{M}$
    pub fn specific_entropy(&self, contributions: Contributions) -> SpecificEntropy {
        self.molar_entropy(contributions) / self.molar_weight()
    }

    /// Specific Gibbs energy: $g^{(m)}=\frac{g}{M}$
    pub fn specific_gibbs_energy(&self, contributions: Contributions) -> SpecificEnergy {
        self.molar_gibbs_energy(contributions) / self.molar_weight()
    }

    /// Specific isochoric heat capacity: $c_v^{(m)}=\frac{c_v}{M}$
    pub fn specific_isochoric_heat_capacity(
        &self,
        contributions: Contributions,
    ) -> SpecificEntropy {
        self.molar_isochoric_heat_capacity(contributions) / self.molar_weight()
    }

    /// Specific isobaric heat capacity: $c_p^{(m)}=\frac{c_p}{M}$
    pub fn specific_isobaric_heat_capacity(&self, contributions: Contributions) -> SpecificEntropy {
        self.molar_isobaric_heat_capacity(contributions) / self.molar_weight()
    }

    /// Speed of sound: $w=\sqrt{\left(\frac{\partial p}{\partial\rho^{(m)}}\right)_s}$
    pub fn speed_of_sound(&self) -> Velocity {
        Velocity::new(self.single_phase(|s| {
            let (d, t) = s.delta_tau();
            let (i, r) = (s.ideal_gas(), s.residual());
            let w2 = s.rt() / s.eos.molar_weight()
                * (1.0 + 2.0 * d * r.a_d + d * d * r.a_dd
                    - (1.0 + d * r.a_d - d * t * r.a_dt).powi(2)
                        / (t * t * (i.a_tt + r.a_tt)));
            w2.sqrt()
        }))
    }
}

/// # Transport properties
///
/// Transport properties are not defined for two-phase states.
impl<E: HelmholtzEnergy + Transport> State<E> {
    fn ensure_single_phase(&self, property: &str) -> MeosResult<()> {
        if self.two_phase.is_some() {
            return Err(MeosError::PropertyUnavailable(format!(
                "{property} of a two-phase state"
            )));
        }
        Ok(())
    }

    /// Dynamic viscosity $\eta$
    pub fn viscosity(&self) -> MeosResult<Viscosity> {
        self.ensure_single_phase("viscosity")?;
        self.eos.viscosity(self.temperature, self.density)
    }

    /// Thermal conductivity $\lambda$
    pub fn thermal_conductivity(&self) -> MeosResult<ThermalConductivity> {
        self.ensure_single_phase("thermal conductivity")?;
        self.eos.thermal_conductivity(self.temperature, self.density)
    }

    /// Kinematic viscosity: $\nu=\frac{\eta}{\rho^{(m)}}$
    pub fn kinematic_viscosity(&self) -> MeosResult<Diffusivity> {
        Ok(self.viscosity()? / self.mass_density())
    }

    /// Thermal diffusivity: $a=\frac{\lambda}{\rho^{(m)}c_p^{(m)}}$
    pub fn thermal_diffusivity(&self) -> MeosResult<Diffusivity> {
        let lambda = self
            .thermal_conductivity()?
            .convert_into(WATT / (METER * KELVIN));
        let cp = self.cp_si() / self.eos.molar_weight();
        Ok(Diffusivity::new(
            lambda / (self.rho * self.eos.molar_weight() * cp),
        ))
    }

    /// Prandtl number: $\mathrm{Pr}=\frac{c_p^{(m)}\eta}{\lambda}$
    pub fn prandtl_number(&self) -> MeosResult<f64> {
        let eta = self.viscosity()?.convert_into(PASCAL * SECOND);
        let lambda = self
            .thermal_conductivity()?
            .convert_into(WATT / (METER * KELVIN));
        Ok(self.cp_si() / self.eos.molar_weight() * eta / lambda)
    }

    /// Surface tension of the vapor-liquid interface at the temperature of the state.
    ///
    /// Only available at or below the critical temperature.
    pub fn surface_tension(&self) -> MeosResult<SurfaceTension> {
        if self.t > self.eos.critical_constants().temperature {
            return Err(MeosError::PropertyUnavailable(String::from(
                "surface tension above the critical temperature",
            )));
        }
        self.eos.surface_tension(self.temperature)
    }
}
