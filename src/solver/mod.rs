//! Solve orchestration.
//!
//! [`SolverDriver`] runs one solve request end to end:
//!
//! 1. Check that the configured backend can run (fail fast otherwise).
//! 2. Compile the roster and attach the objective.
//! 3. Presolve: decide models without variables, violated constant rows,
//!    and structurally infeasible rosters (see [`diagnose`]).
//! 4. Build a greedy incumbent (optional).
//! 5. Run the backend for the remaining time budget.
//! 6. Project the best point onto a [`Schedule`].
//!
//! # States
//!
//! `Built → Solving → {Optimal, FeasibleSuboptimal, Infeasible,
//! TimedOutNoSolution}`. Every transition is logged at debug level. Terminal
//! states are reported in [`SolveReport::status`]; they are not errors.

pub mod backend;
pub mod diagnose;
pub mod greedy;
pub mod gurobi;
pub mod microlp;

pub use backend::{BackendOutcome, RawSolution, SolverBackend};
pub use diagnose::{diagnose, Diagnosis};
pub use greedy::GreedyIncumbent;
pub use gurobi::GurobiBackend;
pub use microlp::MicrolpBackend;

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::compiler::{CompiledModel, ModelCompiler};
use crate::config::{BackendKind, ObjectiveKind, SolveConfig};
use crate::error::{Result, SchedulingError};
use crate::models::{Roster, Schedule};
use crate::objective::ObjectiveBuilder;
use crate::projection::ResultProjector;

/// Terminal outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// The returned schedule is proven optimal.
    Optimal,
    /// A schedule was found but optimality was not proven in time.
    FeasibleSuboptimal,
    /// No schedule exists.
    Infeasible,
    /// The time limit expired before any schedule was found.
    TimedOutNoSolution,
}

impl SolveStatus {
    /// Whether a schedule accompanies this status.
    pub fn has_schedule(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::FeasibleSuboptimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::FeasibleSuboptimal => "Feasible-Suboptimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::TimedOutNoSolution => "TimedOut-NoSolution",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SolverState {
    Built,
    Solving,
    Done(SolveStatus),
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverState::Built => f.write_str("Built"),
            SolverState::Solving => f.write_str("Solving"),
            SolverState::Done(status) => write!(f, "{status}"),
        }
    }
}

/// Where an incumbent came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncumbentSource {
    /// Greedy construction.
    Heuristic,
    /// Exact backend.
    Backend,
}

/// An improving solution found during the solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncumbentRecord {
    /// Objective value.
    pub objective: f64,
    /// Time since the solve started.
    pub elapsed: Duration,
    /// Producer.
    pub source: IncumbentSource,
}

/// Size of the compiled model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    /// Decision variables.
    pub variables: usize,
    /// Constraint rows.
    pub constraints: usize,
    /// Backend that ran (or would have run) the search.
    pub backend: &'static str,
}

/// Result of one solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    /// Terminal state.
    pub status: SolveStatus,
    /// Objective value of the returned schedule.
    pub objective: Option<f64>,
    /// Schedule, present for `Optimal` and `FeasibleSuboptimal`.
    pub schedule: Option<Schedule>,
    /// Reasons for infeasibility, when detectable.
    pub diagnoses: Vec<Diagnosis>,
    /// Improving solutions in the order they were found.
    pub incumbents: Vec<IncumbentRecord>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// Model size.
    pub stats: ModelStats,
}

impl SolveReport {
    /// Whether the returned schedule is proven optimal.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Runs solve requests with a fixed configuration and backend.
///
/// A driver holds no per-solve state; one instance may serve concurrent
/// solves from several threads.
///
/// # Example
/// ```
/// use u_roster::config::SolveConfig;
/// use u_roster::models::{Roster, Shift, Task, TimeOfDay};
/// use u_roster::solver::{SolveStatus, SolverDriver};
///
/// let t = |h| TimeOfDay::hm(h, 0).unwrap();
/// let roster = Roster::new(
///     vec![Task::new("Rounds", t(9), t(11)).with_nurses(2)],
///     vec![Shift::new("Day", t(8), t(16), 3)],
/// ).unwrap();
///
/// let report = SolverDriver::new(SolveConfig::new().with_time_limit_secs(10.0))
///     .solve(&roster)
///     .unwrap();
/// assert_eq!(report.status, SolveStatus::Optimal);
/// assert_eq!(report.schedule.unwrap().headcount(), 14);
/// ```
pub struct SolverDriver {
    config: SolveConfig,
    backend: Box<dyn SolverBackend>,
}

impl fmt::Debug for SolverDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverDriver")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl SolverDriver {
    /// Creates a driver using the backend named in `config`.
    pub fn new(config: SolveConfig) -> Self {
        let backend: Box<dyn SolverBackend> = match config.backend {
            BackendKind::Microlp => Box::new(MicrolpBackend::new()),
            BackendKind::Gurobi => {
                let mut gurobi = GurobiBackend::new();
                if let Some(path) = &config.license_file {
                    gurobi = gurobi.with_license_file(path);
                }
                Box::new(gurobi)
            }
        };
        Self { config, backend }
    }

    /// Replaces the backend.
    pub fn with_backend(mut self, backend: impl SolverBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Solves `roster`.
    ///
    /// # Errors
    /// - [`SchedulingError::InvalidConfig`] for out-of-range parameters.
    /// - [`SchedulingError::LicenseUnavailable`] when the backend cannot run.
    /// - [`SchedulingError::Backend`] when the backend fails or contradicts
    ///   a verified solution.
    /// - [`SchedulingError::Projection`] when solver output does not fit
    ///   the model.
    pub fn solve(&self, roster: &Roster) -> Result<SolveReport> {
        let start = Instant::now();
        self.config.validate()?;
        self.backend.check_available()?;

        let time_limit = self.config.time_limit();
        info!(
            "solving {} task(s), {} shift(s) with {} (limit {:.1}s, min {}/day)",
            roster.tasks().len(),
            roster.shifts().len(),
            self.backend.name(),
            time_limit.as_secs_f64(),
            self.config.min_nurses_per_day
        );

        let mut model = ModelCompiler::new(roster)
            .with_overlap(self.config.overlap)
            .with_min_nurses_per_day(self.config.min_nurses_per_day)
            .compile();
        ObjectiveBuilder::new(self.config.objective).apply(roster, &mut model);

        let mut run = Run {
            roster,
            model: &model,
            start,
            state: SolverState::Built,
            incumbents: Vec::new(),
            stats: ModelStats {
                variables: model.num_variables(),
                constraints: model.num_constraints(),
                backend: self.backend.name(),
            },
        };
        debug!("state: {}", run.state);
        run.transition(SolverState::Solving);

        // Presolve
        let diagnoses = diagnose(
            roster,
            self.config.overlap,
            self.config.min_nurses_per_day,
        );
        let constant_violation = model
            .constraints()
            .iter()
            .any(|row| row.is_constant() && !row.is_satisfied(&[]));
        if !diagnoses.is_empty() || constant_violation {
            debug!("presolve: infeasible ({} diagnosis(es))", diagnoses.len());
            return Ok(run.infeasible(diagnoses));
        }
        if model.num_variables() == 0 {
            debug!("presolve: empty model");
            return run.finish(SolveStatus::Optimal, RawSolution::evaluated(&model, Vec::new()));
        }

        let mut best = None;
        if self.config.incumbent.enabled {
            let heuristic =
                GreedyIncumbent::new(self.config.incumbent.restarts, self.config.incumbent.seed);
            best = heuristic.search(&model, |candidate| {
                run.record(candidate.objective, IncumbentSource::Heuristic);
            });
        }
        if let (Some(incumbent), ObjectiveKind::FeasibilityOnly) = (&best, self.config.objective) {
            debug!("feasibility objective satisfied by the incumbent");
            return run.finish(SolveStatus::Optimal, incumbent.clone());
        }

        let remaining = time_limit.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            warn!("time budget spent before the exact search");
            return run.timed_out(best);
        }

        let outcome = self.backend.solve(&model, remaining)?;
        debug!("{} returned {}", self.backend.name(), outcome.label());
        match outcome {
            BackendOutcome::Optimal(raw) => {
                run.verify(&raw, self.backend.name())?;
                run.record_if_better(&raw, best.as_ref());
                run.finish(SolveStatus::Optimal, raw)
            }
            BackendOutcome::Feasible(raw) => {
                run.verify(&raw, self.backend.name())?;
                run.record_if_better(&raw, best.as_ref());
                let chosen = match best {
                    Some(incumbent) if incumbent.objective <= raw.objective => incumbent,
                    _ => raw,
                };
                run.finish(SolveStatus::FeasibleSuboptimal, chosen)
            }
            BackendOutcome::Infeasible => {
                if best.is_some() {
                    return Err(SchedulingError::Backend(format!(
                        "{} reported infeasible, but a verified schedule exists",
                        self.backend.name()
                    )));
                }
                warn!("{} proved infeasibility without a structural diagnosis", self.backend.name());
                Ok(run.infeasible(Vec::new()))
            }
            BackendOutcome::NoSolution => run.timed_out(best),
        }
    }
}

/// Per-solve bookkeeping.
struct Run<'a> {
    roster: &'a Roster,
    model: &'a CompiledModel,
    start: Instant,
    state: SolverState,
    incumbents: Vec<IncumbentRecord>,
    stats: ModelStats,
}

impl Run<'_> {
    fn transition(&mut self, next: SolverState) {
        debug!("state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn record(&mut self, objective: f64, source: IncumbentSource) {
        let elapsed = self.start.elapsed();
        trace!(
            "incumbent {:.4} from {:?} at {:.3}s",
            objective,
            source,
            elapsed.as_secs_f64()
        );
        self.incumbents.push(IncumbentRecord {
            objective,
            elapsed,
            source,
        });
    }

    fn record_if_better(&mut self, raw: &RawSolution, best: Option<&RawSolution>) {
        if best.map_or(true, |b| raw.objective < b.objective - 1e-9) {
            self.record(raw.objective, IncumbentSource::Backend);
        }
    }

    fn verify(&self, raw: &RawSolution, backend: &str) -> Result<()> {
        if self.model.is_feasible(&raw.values) {
            Ok(())
        } else {
            Err(SchedulingError::Backend(format!(
                "{backend} returned a point that violates the model"
            )))
        }
    }

    fn report(&mut self, status: SolveStatus) -> SolveReport {
        self.transition(SolverState::Done(status));
        let elapsed = self.start.elapsed();
        info!("solve finished: {} in {:.3}s", status, elapsed.as_secs_f64());
        SolveReport {
            status,
            objective: None,
            schedule: None,
            diagnoses: Vec::new(),
            incumbents: std::mem::take(&mut self.incumbents),
            elapsed,
            stats: self.stats.clone(),
        }
    }

    fn finish(mut self, status: SolveStatus, raw: RawSolution) -> Result<SolveReport> {
        let schedule = ResultProjector::new(self.roster, self.model).project(&raw.values)?;
        let mut report = self.report(status);
        report.objective = Some(raw.objective);
        report.schedule = Some(schedule);
        Ok(report)
    }

    fn infeasible(mut self, diagnoses: Vec<Diagnosis>) -> SolveReport {
        for diagnosis in &diagnoses {
            debug!("infeasible: {diagnosis}");
        }
        let mut report = self.report(SolveStatus::Infeasible);
        report.diagnoses = diagnoses;
        report
    }

    fn timed_out(mut self, best: Option<RawSolution>) -> Result<SolveReport> {
        match best {
            Some(incumbent) => self.finish(SolveStatus::FeasibleSuboptimal, incumbent),
            None => Ok(self.report(SolveStatus::TimedOutNoSolution)),
        }
    }
}
