//! Solution projection and reporting views.
//!
//! [`ResultProjector`] turns raw variable values into a [`Schedule`]. The
//! remaining functions derive read-only views from a schedule:
//!
//! - [`coverage_by_day`]: per day and task, required versus covered nurses.
//! - [`shift_utilization`]: per shift-day, load versus capacity.
//! - [`CoverageTimeline`]: 15-minute supply/demand blocks.
//! - [`audit`]: independent re-check of every hard rule.
//! - [`RosterKpi`]: summary indicators.

mod audit;
mod kpi;
mod timeline;

pub use audit::audit;
pub use kpi::RosterKpi;
pub use timeline::{CoverageTimeline, DayTimeline, BLOCK_MINUTES};

use serde::Serialize;
use thiserror::Error;

use crate::compiler::{CompiledModel, VarKind};
use crate::models::{Assignment, Roster, Schedule, Standby, Weekday};

/// Largest distance from an integer still accepted as that integer.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Solver output that does not fit the model.
///
/// These indicate a defect in a backend or in the formulation and are not
/// caused by user input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// An integer variable came back fractional.
    #[error("variable {variable} has fractional value {value}")]
    Fractional {
        /// Variable name.
        variable: String,
        /// Reported value.
        value: f64,
    },
    /// A variable came back negative.
    #[error("variable {variable} has negative value {value}")]
    Negative {
        /// Variable name.
        variable: String,
        /// Reported value.
        value: f64,
    },
    /// The value vector does not match the model.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Number of model variables.
        expected: usize,
        /// Number of values received.
        actual: usize,
    },
    /// A variable points at a task or shift the roster does not have.
    #[error("variable {variable} references an unknown roster entry")]
    UnknownReference {
        /// Variable name.
        variable: String,
    },
}

/// Converts raw solver values into a [`Schedule`].
#[derive(Debug, Clone, Copy)]
pub struct ResultProjector<'a> {
    roster: &'a Roster,
    model: &'a CompiledModel,
}

impl<'a> ResultProjector<'a> {
    /// Creates a projector for a compiled roster.
    pub fn new(roster: &'a Roster, model: &'a CompiledModel) -> Self {
        Self { roster, model }
    }

    /// Projects `values` (one per model variable) onto a schedule.
    ///
    /// Zero values are omitted. The schedule is normalised.
    ///
    /// # Errors
    /// [`ProjectionError`] when a value is negative, not integral, or the
    /// vector length does not match the model.
    pub fn project(&self, values: &[f64]) -> Result<Schedule, ProjectionError> {
        if values.len() != self.model.num_variables() {
            return Err(ProjectionError::LengthMismatch {
                expected: self.model.num_variables(),
                actual: values.len(),
            });
        }

        let mut schedule = Schedule::new();
        for var in self.model.variables() {
            let count = to_count(&var.id.to_string(), values[var.id.index()])?;
            if count == 0 {
                continue;
            }
            let unknown = || ProjectionError::UnknownReference {
                variable: var.id.to_string(),
            };
            match var.kind {
                VarKind::Assignment { shift, task, day } => {
                    let shift = self.roster.shifts().get(shift).ok_or_else(unknown)?;
                    let task = self.roster.tasks().get(task).ok_or_else(unknown)?;
                    schedule.add_assignment(Assignment::new(&shift.name, &task.name, day, count));
                }
                VarKind::Standby { shift, day } => {
                    let shift = self.roster.shifts().get(shift).ok_or_else(unknown)?;
                    schedule.add_standby(Standby::new(&shift.name, day, count));
                }
            }
        }
        schedule.normalize();
        Ok(schedule)
    }
}

fn to_count(variable: &str, value: f64) -> Result<u32, ProjectionError> {
    if value < -INTEGRALITY_TOLERANCE {
        return Err(ProjectionError::Negative {
            variable: variable.to_string(),
            value,
        });
    }
    let rounded = value.round();
    if !value.is_finite() || (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        return Err(ProjectionError::Fractional {
            variable: variable.to_string(),
            value,
        });
    }
    Ok(rounded.max(0.0) as u32)
}

/// Coverage of one task on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCoverage {
    /// Task name.
    pub task: String,
    /// Nurses required.
    pub required: u32,
    /// Nurses assigned.
    pub covered: u32,
    /// Nurses per covering shift.
    pub by_shift: Vec<(String, u32)>,
}

impl TaskCoverage {
    /// Whether the requirement is met.
    pub fn is_met(&self) -> bool {
        self.covered >= self.required
    }
}

/// Task coverage on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCoverage {
    /// Day.
    pub day: Weekday,
    /// One entry per active task, in roster order.
    pub tasks: Vec<TaskCoverage>,
}

/// Per-day coverage table for every day with active tasks.
pub fn coverage_by_day(roster: &Roster, schedule: &Schedule) -> Vec<DayCoverage> {
    Weekday::ALL
        .into_iter()
        .filter_map(|day| {
            let tasks: Vec<TaskCoverage> = roster
                .tasks_on(day)
                .into_iter()
                .map(|t| {
                    let task = &roster.tasks()[t];
                    let by_shift: Vec<(String, u32)> = schedule
                        .assignments_for_task(&task.name, day)
                        .into_iter()
                        .map(|a| (a.shift.clone(), a.nurse_count))
                        .collect();
                    TaskCoverage {
                        task: task.name.clone(),
                        required: task.nurses_required,
                        covered: schedule.covered(&task.name, day),
                        by_shift,
                    }
                })
                .collect();
            (!tasks.is_empty()).then_some(DayCoverage { day, tasks })
        })
        .collect()
}

/// Load of one shift on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftUtilization {
    /// Shift name.
    pub shift: String,
    /// Day.
    pub day: Weekday,
    /// Nurses assigned to tasks.
    pub assigned: u32,
    /// Nurses on standby.
    pub standby: u32,
    /// Shift capacity.
    pub capacity: u32,
    /// `(assigned + standby) / capacity`, 0 when capacity is 0.
    pub utilization: f64,
}

/// Per-shift utilisation for every active shift-day, ordered by day.
pub fn shift_utilization(roster: &Roster, schedule: &Schedule) -> Vec<ShiftUtilization> {
    let mut rows = Vec::new();
    for day in Weekday::ALL {
        for s in roster.shifts_on(day) {
            let shift = &roster.shifts()[s];
            let standby = schedule.standby_on(&shift.name, day);
            let assigned = schedule.shift_load(&shift.name, day) - standby;
            let utilization = if shift.max_nurses == 0 {
                0.0
            } else {
                f64::from(assigned + standby) / f64::from(shift.max_nurses)
            };
            rows.push(ShiftUtilization {
                shift: shift.name.clone(),
                day,
                assigned,
                standby,
                capacity: shift.max_nurses,
                utilization,
            });
        }
    }
    rows
}
