//! Schedule (solution) model.
//!
//! A schedule lists how many nurses of each shift cover each task on each
//! day, plus nurses rostered on a shift-day without a task (standby).
//! Schedules are produced by the result projector and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};

use super::Weekday;

/// Nurses from one shift covering one task on one day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Covering shift.
    pub shift: String,
    /// Covered task.
    pub task: String,
    /// Day of coverage.
    pub day: Weekday,
    /// Number of nurses (at least 1).
    pub nurse_count: u32,
}

/// Nurses on a shift-day that are not assigned to a task.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Standby {
    /// Shift the nurses work.
    pub shift: String,
    /// Day of the shift.
    pub day: Weekday,
    /// Number of nurses (at least 1).
    pub nurse_count: u32,
}

/// A complete roster solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Task coverage assignments, sorted by day, shift, task.
    pub assignments: Vec<Assignment>,
    /// Standby nurses, sorted by day, shift.
    pub standby: Vec<Standby>,
}

/// A problem detected when auditing a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (task or shift name, or the day).
    pub entity: String,
    /// Day on which it occurs.
    pub day: Weekday,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A task has fewer nurses than required.
    Undercovered,
    /// A shift-day uses more nurses than its capacity.
    CapacityExceeded,
    /// A shift covers a task it cannot reach in time (or only during its break).
    IneligibleCoverage,
    /// A day has fewer nurses than the daily minimum.
    BelowDailyMinimum,
    /// An assignment references an unknown or inactive task or shift.
    UnknownReference,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        shift: impl Into<String>,
        task: impl Into<String>,
        day: Weekday,
        nurse_count: u32,
    ) -> Self {
        Self {
            shift: shift.into(),
            task: task.into(),
            day,
            nurse_count,
        }
    }
}

impl Standby {
    /// Creates a new standby entry.
    pub fn new(shift: impl Into<String>, day: Weekday, nurse_count: u32) -> Self {
        Self {
            shift: shift.into(),
            day,
            nurse_count,
        }
    }
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        entity: impl Into<String>,
        day: Weekday,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity: entity.into(),
            day,
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a standby entry.
    pub fn add_standby(&mut self, standby: Standby) {
        self.standby.push(standby);
    }

    /// Sorts entries into canonical order.
    pub fn normalize(&mut self) {
        self.assignments
            .sort_by(|a, b| (a.day, &a.shift, &a.task).cmp(&(b.day, &b.shift, &b.task)));
        self.standby.sort_by(|a, b| (a.day, &a.shift).cmp(&(b.day, &b.shift)));
    }

    /// Assignments on a given day.
    pub fn assignments_on(&self, day: Weekday) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.day == day).collect()
    }

    /// Assignments covering a given task on a given day.
    pub fn assignments_for_task(&self, task: &str, day: Weekday) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.task == task && a.day == day)
            .collect()
    }

    /// Assignments drawn from a given shift on a given day.
    pub fn assignments_for_shift(&self, shift: &str, day: Weekday) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.shift == shift && a.day == day)
            .collect()
    }

    /// Nurses covering `task` on `day`.
    pub fn covered(&self, task: &str, day: Weekday) -> u32 {
        total(self.assignments_for_task(task, day).iter().map(|a| a.nurse_count))
    }

    /// Standby nurses on `shift` on `day`.
    pub fn standby_on(&self, shift: &str, day: Weekday) -> u32 {
        total(
            self.standby
                .iter()
                .filter(|s| s.shift == shift && s.day == day)
                .map(|s| s.nurse_count),
        )
    }

    /// Nurses rostered on `shift` on `day` (assigned plus standby).
    pub fn shift_load(&self, shift: &str, day: Weekday) -> u32 {
        let assigned = total(
            self.assignments_for_shift(shift, day)
                .iter()
                .map(|a| a.nurse_count),
        );
        assigned.saturating_add(self.standby_on(shift, day))
    }

    /// Total nurses rostered on `day`.
    pub fn day_headcount(&self, day: Weekday) -> u32 {
        let assigned = total(
            self.assignments
                .iter()
                .filter(|a| a.day == day)
                .map(|a| a.nurse_count),
        );
        let standby = total(
            self.standby
                .iter()
                .filter(|s| s.day == day)
                .map(|s| s.nurse_count),
        );
        assigned.saturating_add(standby)
    }

    /// Total nurse-shift assignments over the week.
    pub fn headcount(&self) -> u32 {
        total(Weekday::ALL.into_iter().map(|d| self.day_headcount(d)))
    }

    /// Number of assignment entries.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

/// Sum that saturates at `u32::MAX`.
fn total(counts: impl Iterator<Item = u32>) -> u32 {
    counts.fold(0, u32::saturating_add)
}
