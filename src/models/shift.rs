//! Shift model.
//!
//! A shift is a nurse work period: a daily window, a break inside it, a
//! staffing capacity and a cost weight. Shifts play the role resources
//! play in job-shop scheduling.

use serde::{Deserialize, Serialize};

use super::{DaySet, TimeOfDay, TimeWindow, Weekday};

/// A nurse work period with capacity, break and cost weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift name.
    pub name: String,
    /// Maximum nurses that may work this shift on one day.
    pub max_nurses: u32,
    /// Daily working window.
    pub window: TimeWindow,
    /// Break window; empty when the shift has no break.
    pub break_window: TimeWindow,
    /// Cost per nurse per day (lower is preferred).
    pub weight: f64,
    /// Weekdays on which the shift runs.
    pub days: DaySet,
}

impl Shift {
    /// Creates a break-less shift over `[start, end)` with unit weight,
    /// running every day.
    pub fn new(name: impl Into<String>, start: TimeOfDay, end: TimeOfDay, max_nurses: u32) -> Self {
        Self {
            name: name.into(),
            max_nurses,
            window: TimeWindow::new(start, end),
            break_window: TimeWindow::new(start, start),
            weight: 1.0,
            days: DaySet::all(),
        }
    }

    /// Sets a break starting at `start` lasting `duration_min` minutes.
    pub fn with_break(mut self, start: TimeOfDay, duration_min: u32) -> Self {
        self.break_window =
            TimeWindow::from_minutes(start.minutes(), start.minutes().saturating_add(duration_min));
        self
    }

    /// Sets the cost weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the active weekdays.
    pub fn on_days(mut self, days: DaySet) -> Self {
        self.days = days;
        self
    }

    /// Whether the shift runs on `day`.
    #[inline]
    pub fn is_active_on(&self, day: Weekday) -> bool {
        self.days.contains(day)
    }

    /// Whether the shift has a non-empty break.
    pub fn has_break(&self) -> bool {
        !self.break_window.is_empty()
    }

    /// Break length in minutes.
    pub fn break_duration_min(&self) -> u32 {
        self.break_window.duration_min()
    }

    /// Disjoint sub-intervals during which nurses on this shift are
    /// available for work: the window minus the break.
    pub fn availability(&self) -> Vec<TimeWindow> {
        self.window.subtract(&self.break_window)
    }

    /// Working minutes per nurse (window minus break).
    pub fn working_min(&self) -> u32 {
        self.availability().iter().map(TimeWindow::duration_min).sum()
    }
}
