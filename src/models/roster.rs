//! Validated input snapshot.
//!
//! A [`Roster`] bundles the tasks and shifts of one solve request. It can
//! only be obtained through validation, so every downstream stage may rely
//! on the record invariants (non-empty windows, breaks inside shifts,
//! unique names, positive requirements).

use serde::Serialize;

use super::{Shift, Task, Weekday};
use crate::validation::{self, ValidationResult};

/// An immutable, validated set of tasks and shifts.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    tasks: Vec<Task>,
    shifts: Vec<Shift>,
}

impl Roster {
    /// Validates typed records and wraps them in a roster.
    ///
    /// # Errors
    /// Returns every invariant violation found.
    pub fn new(tasks: Vec<Task>, shifts: Vec<Shift>) -> ValidationResult<Self> {
        validation::validate_records(&tasks, &shifts)?;
        Ok(Self { tasks, shifts })
    }

    /// All tasks, in input order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// All shifts, in input order.
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Finds a task by name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Finds a shift by name.
    pub fn shift(&self, name: &str) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.name == name)
    }

    /// Indices of tasks active on `day`.
    pub fn tasks_on(&self, day: Weekday) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_active_on(day))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of shifts active on `day`.
    pub fn shifts_on(&self, day: Weekday) -> Vec<usize> {
        self.shifts
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active_on(day))
            .map(|(i, _)| i)
            .collect()
    }

    /// Days on which at least one task or shift is active.
    pub fn rostered_days(&self) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|&day| {
                self.tasks.iter().any(|t| t.is_active_on(day))
                    || self.shifts.iter().any(|s| s.is_active_on(day))
            })
            .collect()
    }
}
