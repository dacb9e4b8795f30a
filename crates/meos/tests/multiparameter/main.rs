use meos::{MultiParameter, MultiParameterOptions, MultiParameterRecord};
use meos_core::MeosResult;
use meos_core::parameter::{IdentifierOption, PureRecord};
use std::sync::Arc;

mod parameters;
mod properties;
mod reference_state;
mod state_creation;
mod transport;
mod vle_pure;

const PARAMETERS: &str = "../../parameters/multiparameter/fluids.json";

fn records() -> MeosResult<Vec<PureRecord<MultiParameterRecord>>> {
    PureRecord::from_file(PARAMETERS)
}

fn fluid(name: &str, options: &MultiParameterOptions) -> MeosResult<Arc<MultiParameter>> {
    Ok(Arc::new(MultiParameter::from_json(
        name,
        PARAMETERS,
        IdentifierOption::Name,
        options,
    )?))
}

fn ethane() -> MeosResult<Arc<MultiParameter>> {
    fluid("ethane", &MultiParameterOptions::default())
}

fn propane() -> MeosResult<Arc<MultiParameter>> {
    fluid("propane", &MultiParameterOptions::default())
}
