#![warn(clippy::all)]
#![warn(clippy::allow_attributes)]
//! Multiparameter equations of state for pure fluids.
//!
//! Fluids are read from json parameter files and implement the
//! [HelmholtzEnergyDyn](meos_core::HelmholtzEnergyDyn) and
//! [Transport](meos_core::Transport) traits of `meos-core`, so that all
//! state properties, flash calculations and phase equilibria are
//! available for them.
//!
//! ```no_run
//! # use meos::{MultiParameter, MultiParameterOptions};
//! # use meos_core::parameter::IdentifierOption;
//! # use meos_core::{MeosResult, PhaseEquilibrium, SolverOptions};
//! # use quantity::*;
//! # use std::sync::Arc;
//! # fn main() -> MeosResult<()> {
//! let ethane = Arc::new(MultiParameter::from_json(
//!     "ethane",
//!     "parameters/multiparameter/fluids.json",
//!     IdentifierOption::Name,
//!     &MultiParameterOptions::default(),
//! )?);
//! let vle = PhaseEquilibrium::pure(&ethane, 250.0 * KELVIN, None, SolverOptions::default())?;
//! println!("{}", vle.liquid().viscosity()?);
//! # Ok(())
//! # }
//! ```
pub mod ancillary;
pub mod multiparameter;
pub mod phase_boundary;
pub mod transport;

pub use multiparameter::{
    EquationRecord, MultiParameter, MultiParameterOptions, MultiParameterRecord, ReferenceState,
};
