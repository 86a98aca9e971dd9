//! Error taxonomy.
//!
//! Only conditions that stop a solve are errors. Solver outcomes such as
//! infeasibility or running out of time are reported through
//! [`SolveStatus`](crate::solver::SolveStatus) in a successful report.

use thiserror::Error;

use crate::projection::ProjectionError;
use crate::validation::ValidationError;

/// Errors raised while loading input or running a solve.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Input rows are malformed or contradictory.
    #[error("invalid input ({} problem(s)): {}", .0.len(), summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A solve parameter is out of range.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("cannot parse solver configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The selected backend cannot run in this environment.
    #[error("solver backend '{backend}' unavailable: {reason}")]
    LicenseUnavailable {
        /// Backend name.
        backend: &'static str,
        /// Why it cannot run.
        reason: String,
    },

    /// The backend failed in a way that is not a solve outcome.
    #[error("solver backend failure: {0}")]
    Backend(String),

    /// Solver output does not fit the model (internal defect).
    #[error("internal consistency failure: {0}")]
    Projection(#[from] ProjectionError),
}

impl From<Vec<ValidationError>> for SchedulingError {
    fn from(errors: Vec<ValidationError>) -> Self {
        SchedulingError::Validation(errors)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for rostering operations.
pub type Result<T> = std::result::Result<T, SchedulingError>;
