use crate::equation_of_state::{HelmholtzDerivatives, ThirdDerivatives};
use std::sync::OnceLock;

#[derive(Clone, Debug, Default)]
pub struct Cache {
    pub residual: OnceLock<HelmholtzDerivatives>,
    pub ideal_gas: OnceLock<HelmholtzDerivatives>,
    pub third: OnceLock<ThirdDerivatives>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }
}
