use std::io;
use thiserror::Error;

/// Error type for invalid configurations, improperly defined states
/// and convergence problems.
#[derive(Error, Debug)]
pub enum MeosError {
    // errors related to the configuration of fluids and correlations
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("The following component(s) were not found: {0}")]
    ComponentsNotFound(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),

    // errors related to the inputs of a calculation
    #[error("{property} = {value} is outside of the valid range [{min}, {max}].")]
    OutOfRange {
        property: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Invalid state in {0}: {1} = {2}.")]
    InvalidState(String, String, f64),

    // errors related to algorithms
    #[error(
        "`{solver}` did not converge within {iterations} iterations (last estimate: {estimate})."
    )]
    NotConverged {
        solver: String,
        iterations: usize,
        estimate: f64,
    },
    #[error("`{0}` encountered illegal values during the iteration.")]
    IterationFailed(String),
    #[error("Iteration resulted in trivial solution.")]
    TrivialSolution,
    #[error("System is supercritical.")]
    SuperCritical,
    #[error("Undetermined state: {0}.")]
    UndeterminedState(String),
    #[error("Property not available: {0}.")]
    PropertyUnavailable(String),
}

impl MeosError {
    pub fn not_converged(solver: &str, iterations: usize, estimate: f64) -> Self {
        Self::NotConverged {
            solver: solver.into(),
            iterations,
            estimate,
        }
    }

    pub fn out_of_range(property: &str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            property: property.into(),
            value,
            min,
            max,
        }
    }

    /// Whether a solver may retry the calculation from a different initial value.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConverged { .. } | Self::IterationFailed(_) | Self::TrivialSolution
        )
    }
}

/// Convenience type for `Result<T, MeosError>`.
pub type MeosResult<T> = Result<T, MeosError>;
