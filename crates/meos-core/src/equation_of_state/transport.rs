use crate::errors::MeosResult;
use quantity::{Density, SurfaceTension, Temperature, ThermalConductivity, Viscosity};
use std::ops::Deref;

/// Transport and interfacial property correlations of a fluid.
///
/// Implementations return [MeosError::PropertyUnavailable](crate::MeosError::PropertyUnavailable)
/// if no correlation is available.
pub trait Transport {
    fn viscosity(&self, temperature: Temperature, density: Density) -> MeosResult<Viscosity>;

    fn thermal_conductivity(
        &self,
        temperature: Temperature,
        density: Density,
    ) -> MeosResult<ThermalConductivity>;

    /// Surface tension of the saturated liquid at the given temperature.
    fn surface_tension(&self, temperature: Temperature) -> MeosResult<SurfaceTension>;
}

impl<C: Deref<Target = T>, T: Transport> Transport for C {
    fn viscosity(&self, temperature: Temperature, density: Density) -> MeosResult<Viscosity> {
        self.deref().viscosity(temperature, density)
    }
    fn thermal_conductivity(
        &self,
        temperature: Temperature,
        density: Density,
    ) -> MeosResult<ThermalConductivity> {
        self.deref().thermal_conductivity(temperature, density)
    }
    fn surface_tension(&self, temperature: Temperature) -> MeosResult<SurfaceTension> {
        self.deref().surface_tension(temperature)
    }
}
