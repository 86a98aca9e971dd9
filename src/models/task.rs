//! Task model.
//!
//! A task is a unit of required nursing work: a daily time window, the
//! number of nurses it needs, and the weekdays on which it recurs.

use serde::{Deserialize, Serialize};

use super::{DaySet, TimeOfDay, TimeWindow, Weekday};

/// A recurring unit of work that must be covered by nurses.
///
/// # Time Representation
/// `window` is the daily interval the task occupies. `duration_min` is the
/// actual work time; when shorter than the window the work may happen
/// anywhere inside it, and coverage is still judged against the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name.
    pub name: String,
    /// Daily time window.
    pub window: TimeWindow,
    /// Work duration in minutes (`1..=window length`).
    pub duration_min: u32,
    /// Nurses needed simultaneously (at least 1).
    pub nurses_required: u32,
    /// Weekdays on which the task is active.
    pub days: DaySet,
}

impl Task {
    /// Creates a task spanning `[start, end)` that needs one nurse every day.
    ///
    /// Duration defaults to the full window.
    pub fn new(name: impl Into<String>, start: TimeOfDay, end: TimeOfDay) -> Self {
        let window = TimeWindow::new(start, end);
        Self {
            name: name.into(),
            window,
            duration_min: window.duration_min(),
            nurses_required: 1,
            days: DaySet::all(),
        }
    }

    /// Sets the number of nurses required.
    pub fn with_nurses(mut self, nurses_required: u32) -> Self {
        self.nurses_required = nurses_required;
        self
    }

    /// Sets the work duration (minutes).
    pub fn with_duration(mut self, duration_min: u32) -> Self {
        self.duration_min = duration_min;
        self
    }

    /// Sets the active weekdays.
    pub fn on_days(mut self, days: DaySet) -> Self {
        self.days = days;
        self
    }

    /// Whether the task is active on `day`.
    #[inline]
    pub fn is_active_on(&self, day: Weekday) -> bool {
        self.days.contains(day)
    }

    /// Whether the work fills the whole window.
    pub fn is_fixed(&self) -> bool {
        self.duration_min == self.window.duration_min()
    }

    /// Nurse-minutes of work per active day.
    pub fn nurse_minutes(&self) -> u64 {
        u64::from(self.duration_min) * u64::from(self.nurses_required)
    }
}
