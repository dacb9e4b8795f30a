//! Multiparameter Helmholtz energy equations of state.
//!
//! A fluid is described by one or more equations of state, each given as
//! groups of ideal gas and residual terms, together with optional
//! ancillary equations, phase boundary curves and transport correlations.
use crate::ancillary::Ancillaries;
use crate::phase_boundary::PhaseBoundaryCurve;
use crate::transport::{
    EcsMapping, EcsRecord, SurfaceTensionCorrelation, ThermalConductivityCorrelation,
    ViscosityCorrelation,
};
use indexmap::IndexMap;
use itertools::Itertools;
use meos_core::parameter::{Identifier, IdentifierOption, PureRecord};
use meos_core::{
    CriticalConstants, HelmholtzEnergy, HelmholtzEnergyDyn, Limits, MeosError, MeosResult,
    ReducedVariables, SaturationEstimate, Transport,
};
use num_dual::DualNum;
use quantity::{
    Density, KELVIN, METER, MOL, NEWTON, PASCAL, Pressure, SECOND, SurfaceTension, Temperature,
    ThermalConductivity, Viscosity, WATT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

mod ideal_gas_function;
mod reference_state;
mod residual_function;
mod term_group;
pub use ideal_gas_function::IdealGasFunction;
pub use reference_state::ReferenceState;
pub use residual_function::ResidualFunction;
pub use term_group::TermGroup;
use term_group::flatten;

/// Molar gas constant (CODATA 2018) in J/(mol K).
pub const RGAS: f64 = 8.314462618;

// record

fn default_gas_constant() -> f64 {
    RGAS
}

/// A single equation of state of a fluid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquationRecord {
    pub name: String,
    #[serde(default)]
    pub reference: String,
    /// Critical temperature in K
    pub tc: f64,
    /// Critical density in mol/m³
    pub rhoc: f64,
    /// Critical pressure in Pa
    pub pc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_red: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rho_red: Option<f64>,
    /// Gas constant of the formulation in J/(mol K)
    #[serde(default = "default_gas_constant")]
    pub r: f64,
    /// Triple point temperature in K
    pub t_triple: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_min: Option<f64>,
    pub t_max: f64,
    pub p_max: f64,
    pub rho_max: f64,
    pub ideal_gas: Vec<TermGroup>,
    pub residual: Vec<TermGroup>,
}

/// All parameters of a fluid as stored in parameter files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiParameterRecord {
    pub equations: Vec<EquationRecord>,
    /// Replacements of the ideal gas terms, e.g., for spin isomers.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ideal_gas_variants: IndexMap<String, Vec<TermGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancillaries: Option<Ancillaries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub melting: Option<PhaseBoundaryCurve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublimation: Option<PhaseBoundaryCurve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_tension: Option<SurfaceTensionCorrelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viscosity: Option<ViscosityCorrelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_conductivity: Option<ThermalConductivityCorrelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs: Option<EcsRecord>,
}

/// Options used when a fluid is built from its record.
#[derive(Clone, Debug, Default)]
pub struct MultiParameterOptions {
    /// Name of the equation of state, defaults to the first one.
    pub equation: Option<String>,
    /// Name of the ideal gas variant.
    pub variant: Option<String>,
    pub reference_state: ReferenceState,
}

impl MultiParameterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equation(mut self, equation: &str) -> Self {
        self.equation = Some(equation.into());
        self
    }

    pub fn variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn reference_state(mut self, reference_state: ReferenceState) -> Self {
        self.reference_state = reference_state;
        self
    }
}

// structs

/// A pure fluid described by a multiparameter equation of state.
#[derive(Clone, Debug)]
pub struct MultiParameter {
    identifier: Identifier,
    name: String,
    equation: String,
    references: Vec<String>,
    /// molar weight in kg/mol
    molar_weight: f64,
    critical: CriticalConstants,
    t_red: f64,
    rho_red: f64,
    r: f64,
    t_triple: f64,
    limits: Limits,
    residual: Vec<ResidualFunction>,
    ideal_gas: Vec<IdealGasFunction>,
    reference_state: ReferenceState,
    ancillaries: Option<Ancillaries>,
    melting: Option<PhaseBoundaryCurve>,
    sublimation: Option<PhaseBoundaryCurve>,
    surface_tension: Option<SurfaceTensionCorrelation>,
    viscosity: Option<ViscosityCorrelation>,
    thermal_conductivity: Option<ThermalConductivityCorrelation>,
    ecs: Option<EcsMapping>,
}

fn positive(value: f64, name: &str, fluid: &str) -> MeosResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MeosError::Configuration(format!(
            "{name} = {value} of {fluid} has to be positive"
        )))
    }
}

impl MultiParameter {
    /// Build a fluid from its record.
    ///
    /// Fluids that use extended corresponding states need the records of
    /// their reference fluids and have to be built with [MultiParameter::from_records].
    pub fn new(
        record: &PureRecord<MultiParameterRecord>,
        options: &MultiParameterOptions,
    ) -> MeosResult<Self> {
        Self::from_records_inner(record, &[], options, &mut Vec::new())
    }

    /// Read a fluid from a json file.
    pub fn from_json<P: AsRef<Path>>(
        substance: &str,
        file: P,
        identifier_option: IdentifierOption,
        options: &MultiParameterOptions,
    ) -> MeosResult<Self> {
        let records = PureRecord::from_file(file)?;
        Self::from_records(substance, &records, identifier_option, options)
    }

    /// Build a fluid from a list of records.
    ///
    /// Reference fluids of the extended corresponding states model are
    /// looked up by any of their identifiers in the same list.
    pub fn from_records(
        substance: &str,
        records: &[PureRecord<MultiParameterRecord>],
        identifier_option: IdentifierOption,
        options: &MultiParameterOptions,
    ) -> MeosResult<Self> {
        let record = records
            .iter()
            .find(|r| r.identifier.as_str(identifier_option) == Some(substance))
            .ok_or_else(|| MeosError::ComponentsNotFound(substance.into()))?;
        Self::from_records_inner(record, records, options, &mut Vec::new())
    }

    fn from_records_inner(
        record: &PureRecord<MultiParameterRecord>,
        records: &[PureRecord<MultiParameterRecord>],
        options: &MultiParameterOptions,
        visited: &mut Vec<String>,
    ) -> MeosResult<Self> {
        let mut fluid = Self::from_record(record, options)?;
        if visited.contains(&fluid.name) {
            return Err(MeosError::Configuration(format!(
                "circular ECS reference: {} -> {}",
                visited.join(" -> "),
                fluid.name
            )));
        }
        visited.push(fluid.name.clone());

        if let Some(ecs) = &record.model_record.ecs {
            let reference_record = records
                .iter()
                .find(|r| identifies(&r.identifier, &ecs.reference_fluid))
                .ok_or_else(|| {
                    MeosError::Configuration(format!(
                        "ECS reference fluid `{}` of {} is not available",
                        ecs.reference_fluid, fluid.name
                    ))
                })?;
            let reference_options = MultiParameterOptions {
                equation: ecs.equation.clone(),
                ..Default::default()
            };
            let reference =
                Self::from_records_inner(reference_record, records, &reference_options, visited)?;
            if let Some(reference) = &ecs.reference {
                fluid.references.push(reference.clone());
            }
            fluid.ecs = Some(EcsMapping::new(ecs.clone(), Arc::new(reference))?);
        }

        let uses_ecs = matches!(fluid.viscosity, Some(ViscosityCorrelation::Ecs))
            || matches!(
                fluid.thermal_conductivity,
                Some(ThermalConductivityCorrelation::Ecs)
            );
        if uses_ecs && fluid.ecs.is_none() {
            return Err(MeosError::Configuration(format!(
                "{} uses ECS transport correlations without ECS parameters",
                fluid.name
            )));
        }
        Ok(fluid)
    }

    fn from_record(
        record: &PureRecord<MultiParameterRecord>,
        options: &MultiParameterOptions,
    ) -> MeosResult<Self> {
        let name = record
            .identifier
            .as_readable_str()
            .unwrap_or("unnamed fluid")
            .to_string();
        let model = &record.model_record;

        let equation = match &options.equation {
            Some(selected) => model
                .equations
                .iter()
                .find(|e| &e.name == selected)
                .ok_or_else(|| {
                    MeosError::Configuration(format!(
                        "unknown equation `{selected}` for {name}, available: {}",
                        model.equations.iter().map(|e| &e.name).join(", ")
                    ))
                })?,
            None => model.equations.first().ok_or_else(|| {
                MeosError::Configuration(format!("no equation of state for {name}"))
            })?,
        };
        let ideal_gas_groups = match &options.variant {
            Some(variant) => model.ideal_gas_variants.get(variant).ok_or_else(|| {
                MeosError::Configuration(format!(
                    "unknown ideal gas variant `{variant}` for {name}, available: {}",
                    model.ideal_gas_variants.keys().join(", ")
                ))
            })?,
            None => &equation.ideal_gas,
        };
        let residual: Vec<ResidualFunction> = flatten(&equation.residual)?;
        let ideal_gas: Vec<IdealGasFunction> = flatten(ideal_gas_groups)?;
        if residual.is_empty() || ideal_gas.is_empty() {
            return Err(MeosError::Configuration(format!(
                "equation `{}` of {name} without residual or ideal gas terms",
                equation.name
            )));
        }

        let critical = CriticalConstants {
            temperature: positive(equation.tc, "tc", &name)?,
            density: positive(equation.rhoc, "rhoc", &name)?,
            pressure: positive(equation.pc, "pc", &name)?,
        };
        let t_triple = positive(equation.t_triple, "t_triple", &name)?;
        let limits = Limits {
            t_min: equation.t_min.unwrap_or(t_triple),
            t_max: positive(equation.t_max, "t_max", &name)?,
            p_max: positive(equation.p_max, "p_max", &name)?,
            rho_max: positive(equation.rho_max, "rho_max", &name)?,
        };

        let ancillaries = model
            .ancillaries
            .as_ref()
            .map(|a| a.validate(critical))
            .transpose()?;
        for curve in model.melting.iter().chain(&model.sublimation) {
            curve.validate()?;
        }
        let surface_tension = model
            .surface_tension
            .as_ref()
            .map(|s| s.validate(critical.temperature))
            .transpose()?;
        if let Some(viscosity) = &model.viscosity {
            viscosity.validate()?;
        }
        if let Some(thermal_conductivity) = &model.thermal_conductivity {
            thermal_conductivity.validate()?;
        }

        let references = std::iter::once(Some(equation.reference.as_str()))
            .chain(ancillaries.iter().flat_map(|a| {
                [&a.vapor_pressure, &a.liquid_density, &a.vapor_density]
                    .map(|c| c.reference.as_deref())
            }))
            .chain(
                model
                    .melting
                    .iter()
                    .chain(&model.sublimation)
                    .map(|c| c.terms().reference.as_deref()),
            )
            .chain(surface_tension.iter().map(|s| s.reference.as_deref()))
            .chain(model.viscosity.iter().map(|v| v.reference()))
            .chain(model.thermal_conductivity.iter().map(|t| t.reference()))
            .flatten()
            .filter(|r| !r.is_empty())
            .unique()
            .map(String::from)
            .collect();

        let molar_weight = positive(record.molarweight, "molarweight", &name)? * 1e-3;
        let r = positive(equation.r, "r", &name)?;
        let mut fluid = Self {
            identifier: record.identifier.clone(),
            name,
            equation: equation.name.clone(),
            references,
            molar_weight,
            critical,
            t_red: equation.t_red.unwrap_or(critical.temperature),
            rho_red: equation.rho_red.unwrap_or(critical.density),
            r,
            t_triple,
            limits,
            residual,
            ideal_gas,
            reference_state: ReferenceState::Equation,
            ancillaries,
            melting: model.melting.clone(),
            sublimation: model.sublimation.clone(),
            surface_tension,
            viscosity: model.viscosity.clone(),
            thermal_conductivity: model.thermal_conductivity.clone(),
            ecs: None,
        };
        if let Some(offset) = options.reference_state.offset(&fluid)? {
            fluid.ideal_gas.push(offset);
            fluid.reference_state = options.reference_state;
        }
        Ok(fluid)
    }

    /// Readable name of the fluid.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Name of the selected equation of state.
    pub fn equation(&self) -> &str {
        &self.equation
    }

    /// References of the equation of state and all correlations.
    pub fn references(&self) -> Vec<&str> {
        self.references.iter().map(String::as_str).collect()
    }

    pub fn reference_state(&self) -> ReferenceState {
        self.reference_state
    }

    /// Triple point temperature.
    pub fn triple_point_temperature(&self) -> Temperature {
        self.t_triple * KELVIN
    }

    pub fn ancillaries(&self) -> Option<&Ancillaries> {
        self.ancillaries.as_ref()
    }

    pub fn residual_terms(&self) -> &[ResidualFunction] {
        &self.residual
    }

    pub fn ideal_gas_terms(&self) -> &[IdealGasFunction] {
        &self.ideal_gas
    }

    pub fn viscosity_correlation(&self) -> Option<&ViscosityCorrelation> {
        self.viscosity.as_ref()
    }

    pub fn thermal_conductivity_correlation(&self) -> Option<&ThermalConductivityCorrelation> {
        self.thermal_conductivity.as_ref()
    }

    pub fn ecs(&self) -> Option<&EcsMapping> {
        self.ecs.as_ref()
    }

    /// Pressure on the melting curve.
    pub fn melting_pressure(&self, temperature: Temperature) -> MeosResult<Pressure> {
        let curve = self.melting.as_ref().ok_or_else(|| {
            MeosError::PropertyUnavailable(format!("no melting curve for {}", self.name))
        })?;
        Ok(curve.pressure(temperature.convert_into(KELVIN))? * PASCAL)
    }

    /// Pressure on the sublimation curve.
    pub fn sublimation_pressure(&self, temperature: Temperature) -> MeosResult<Pressure> {
        let curve = self.sublimation.as_ref().ok_or_else(|| {
            MeosError::PropertyUnavailable(format!("no sublimation curve for {}", self.name))
        })?;
        Ok(curve.pressure(temperature.convert_into(KELVIN))? * PASCAL)
    }

    /// Ideal gas isobaric heat capacity in J/(mol K).
    pub(crate) fn ideal_gas_heat_capacity(&self, temperature: f64) -> f64 {
        let rv = ReducedVariables::new(temperature, self.rho_red, self.t_red, self.rho_red);
        let a = self.ideal_gas_derivatives(rv);
        self.r * (1.0 - rv.tau * rv.tau * a.a_tt)
    }

    /// Viscosity in Pa s.
    pub(crate) fn viscosity_si(&self, temperature: f64, density: f64) -> MeosResult<f64> {
        self.viscosity
            .as_ref()
            .ok_or_else(|| {
                MeosError::PropertyUnavailable(format!("no viscosity correlation for {}", self.name))
            })?
            .evaluate(self, temperature, density)
    }
}

fn identifies(identifier: &Identifier, id: &str) -> bool {
    [
        IdentifierOption::Name,
        IdentifierOption::Cas,
        IdentifierOption::IupacName,
        IdentifierOption::Smiles,
        IdentifierOption::Inchi,
        IdentifierOption::Formula,
    ]
    .into_iter()
    .any(|option| identifier.as_str(option) == Some(id))
}

// eos trait implementations

impl HelmholtzEnergyDyn for MultiParameter {
    fn reducing_point(&self) -> (f64, f64) {
        (self.t_red, self.rho_red)
    }

    fn critical_constants(&self) -> CriticalConstants {
        self.critical
    }

    fn gas_constant(&self) -> f64 {
        self.r
    }

    fn molar_weight(&self) -> f64 {
        self.molar_weight
    }

    fn limits(&self) -> Limits {
        self.limits
    }

    fn residual<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        self.residual.iter().map(|r| r.evaluate(delta, tau)).sum()
    }

    fn ideal_gas<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        self.ideal_gas.iter().map(|r| r.evaluate(delta, tau)).sum()
    }

    fn saturation_estimate(&self, temperature: f64) -> Option<SaturationEstimate> {
        self.ancillaries.as_ref()?.estimate(temperature)
    }

    fn saturation_temperature_estimate(&self, pressure: f64) -> Option<f64> {
        self.ancillaries.as_ref()?.temperature(pressure)
    }
}

impl Transport for MultiParameter {
    fn viscosity(&self, temperature: Temperature, density: Density) -> MeosResult<Viscosity> {
        let t = temperature.convert_into(KELVIN);
        let rho = density.convert_into(MOL / (METER * METER * METER));
        Ok(self.viscosity_si(t, rho)? * PASCAL * SECOND)
    }

    fn thermal_conductivity(
        &self,
        temperature: Temperature,
        density: Density,
    ) -> MeosResult<ThermalConductivity> {
        let t = temperature.convert_into(KELVIN);
        let rho = density.convert_into(MOL / (METER * METER * METER));
        let lambda = self
            .thermal_conductivity
            .as_ref()
            .ok_or_else(|| {
                MeosError::PropertyUnavailable(format!(
                    "no thermal conductivity correlation for {}",
                    self.name
                ))
            })?
            .evaluate(self, t, rho)?;
        Ok(lambda * WATT / (METER * KELVIN))
    }

    fn surface_tension(&self, temperature: Temperature) -> MeosResult<SurfaceTension> {
        let sigma = self
            .surface_tension
            .as_ref()
            .ok_or_else(|| {
                MeosError::PropertyUnavailable(format!(
                    "no surface tension correlation for {}",
                    self.name
                ))
            })?
            .evaluate(temperature.convert_into(KELVIN))?;
        Ok(sigma * NEWTON / METER)
    }
}
