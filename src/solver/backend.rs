//! Solver backend abstraction.
//!
//! A backend receives a [`CompiledModel`] and a time budget and reports
//! what the search established. Availability (licenses, executables) is
//! checked separately so a missing precondition fails fast.

use std::time::Duration;

use crate::compiler::CompiledModel;
use crate::error::Result;

/// Variable values reported by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// Value per variable, indexed by `VarId`.
    pub values: Vec<f64>,
    /// Objective value reported by the backend.
    pub objective: f64,
}

impl RawSolution {
    /// Creates a solution, evaluating the objective against `model`.
    pub fn evaluated(model: &CompiledModel, values: Vec<f64>) -> Self {
        let objective = model.objective_value(&values);
        Self { values, objective }
    }
}

/// What a backend search established.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// Proven optimal solution.
    Optimal(RawSolution),
    /// Feasible solution found before the time limit, optimality not proven.
    Feasible(RawSolution),
    /// The model admits no solution.
    Infeasible,
    /// Time limit reached without any feasible solution.
    NoSolution,
}

impl BackendOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            BackendOutcome::Optimal(_) => "optimal",
            BackendOutcome::Feasible(_) => "feasible",
            BackendOutcome::Infeasible => "infeasible",
            BackendOutcome::NoSolution => "no solution",
        }
    }
}

/// An integer programming engine.
///
/// Implementations must be usable from several threads; each call to
/// [`solve`](Self::solve) works on its own model.
pub trait SolverBackend: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Checks environment preconditions (license, executables).
    ///
    /// # Errors
    /// [`SchedulingError::LicenseUnavailable`](crate::error::SchedulingError::LicenseUnavailable)
    /// when the backend cannot run here.
    fn check_available(&self) -> Result<()>;

    /// Minimises the model's objective within `time_limit`.
    ///
    /// The time limit is a soft cutoff. Rows without variables are already
    /// decided by the caller and may be skipped.
    ///
    /// # Errors
    /// [`SchedulingError::Backend`](crate::error::SchedulingError::Backend)
    /// on failures that are not solve outcomes.
    fn solve(&self, model: &CompiledModel, time_limit: Duration) -> Result<BackendOutcome>;
}
