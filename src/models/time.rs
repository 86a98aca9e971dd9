//! Time-of-day values and half-open intervals.
//!
//! All roster times are minutes from midnight of the day an entity is
//! active on. A day spans `[0, 1440)`; `24:00` is accepted as the
//! exclusive end of a window.
//!
//! # Interval arithmetic
//! Shift availability is the shift window minus its break window, which
//! yields at most two disjoint sub-intervals (see [`TimeWindow::subtract`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time expressed as minutes after midnight (`0..=1440`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// Midnight at the start of the day.
    pub const MIDNIGHT: Self = Self(0);
    /// Midnight at the end of the day (`24:00`).
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY);

    /// Creates a time from hours and minutes.
    ///
    /// Returns `None` when the time is outside `00:00..=24:00`.
    pub fn hm(hours: u32, minutes: u32) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        Self::from_minutes(hours.checked_mul(60)?.checked_add(minutes)?)
    }

    /// Creates a time from minutes after midnight.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Parses `HH:MM` or `HH:MM:SS` (seconds must be zero).
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split(':');
        let hours: u32 = parts.next()?.trim().parse().ok()?;
        let minutes: u32 = parts.next()?.trim().parse().ok()?;
        if let Some(seconds) = parts.next() {
            let seconds: u32 = seconds.trim().parse().ok()?;
            if seconds != 0 {
                return None;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Self::hm(hours, minutes)
    }

    /// Minutes after midnight.
    #[inline]
    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// A time interval [start, end) within one day.
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: TimeOfDay,
    /// Interval end (exclusive).
    pub end: TimeOfDay,
}

impl TimeWindow {
    /// Creates a new time window. Callers guarantee `start <= end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Creates a window from raw minute offsets, clamping to the day.
    pub fn from_minutes(start: u32, end: u32) -> Self {
        let start = start.min(MINUTES_PER_DAY);
        let end = end.clamp(start, MINUTES_PER_DAY);
        Self::new(TimeOfDay(start), TimeOfDay(end))
    }

    /// Length of this window in minutes.
    #[inline]
    pub fn duration_min(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Whether the window has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely inside this window.
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether two windows share a positive-length span.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length of the shared span, in minutes.
    pub fn overlap_min(&self, other: &Self) -> u32 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.0.saturating_sub(start.0)
    }

    /// Removes `cut` from this window.
    ///
    /// Returns the remaining disjoint, non-empty pieces in time order
    /// (zero, one or two windows).
    pub fn subtract(&self, cut: &Self) -> Vec<Self> {
        if cut.is_empty() || !self.overlaps(cut) {
            return if self.is_empty() { Vec::new() } else { vec![*self] };
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start < cut.start {
            pieces.push(Self::new(self.start, cut.start));
        }
        if cut.end < self.end {
            pieces.push(Self::new(cut.end, self.end));
        }
        pieces
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(start: u32, end: u32) -> TimeWindow {
        TimeWindow::from_minutes(start, end)
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(TimeOfDay::parse("08:30").unwrap().minutes(), 510);
        assert_eq!(TimeOfDay::parse(" 7:05 ").unwrap().minutes(), 425);
        assert_eq!(TimeOfDay::parse("16:00:00").unwrap().minutes(), 960);
        assert_eq!(TimeOfDay::parse("24:00"), Some(TimeOfDay::END_OF_DAY));
        assert!(TimeOfDay::parse("24:15").is_none());
        assert!(TimeOfDay::parse("12:60").is_none());
        assert!(TimeOfDay::parse("12:00:30").is_none());
        assert!(TimeOfDay::parse("noon").is_none());
        assert!(TimeOfDay::parse("12").is_none());
        assert!(TimeOfDay::parse("71582789:00").is_none());
        assert!(TimeOfDay::hm(u32::MAX, 59).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeOfDay::hm(9, 5).unwrap().to_string(), "09:05");
        assert_eq!(w(480, 960).to_string(), "08:00-16:00");
    }

    #[test]
    fn test_overlap_and_containment() {
        let shift = w(480, 960);
        assert!(shift.contains(&w(540, 600)));
        assert!(!shift.contains(&w(540, 1020)));
        assert!(shift.overlaps(&w(540, 1020)));
        assert_eq!(shift.overlap_min(&w(540, 1020)), 420);
        // Touching endpoints do not overlap.
        assert!(!shift.overlaps(&w(960, 1020)));
        assert_eq!(shift.overlap_min(&w(960, 1020)), 0);
    }

    #[test]
    fn test_subtract_middle() {
        let pieces = w(480, 960).subtract(&w(720, 750));
        assert_eq!(pieces, vec![w(480, 720), w(750, 960)]);
    }

    #[test]
    fn test_subtract_edges() {
        assert_eq!(w(480, 960).subtract(&w(480, 510)), vec![w(510, 960)]);
        assert_eq!(w(480, 960).subtract(&w(930, 960)), vec![w(480, 930)]);
        assert!(w(480, 960).subtract(&w(400, 1000)).is_empty());
    }

    #[test]
    fn test_subtract_disjoint_or_empty() {
        assert_eq!(w(480, 960).subtract(&w(1000, 1100)), vec![w(480, 960)]);
        assert_eq!(w(480, 960).subtract(&w(600, 600)), vec![w(480, 960)]);
    }
}
