//! Roster quality metrics (KPIs).
//!
//! Computes summary indicators from a completed schedule and its roster.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total cost | Σ shift.weight × nurses rostered (assigned + standby) |
//! | Headcount | Nurse-shift slots used over the week |
//! | Task nurse-minutes | Σ nurses × task duration over assignments |
//! | Coverage rate | Fraction of active (task, day) pairs fully covered |
//! | Avg utilization | Mean load/capacity over active shift-days |

use std::collections::HashMap;

use serde::Serialize;

use super::shift_utilization;
use crate::models::{Roster, Schedule, Weekday};

/// Roster performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct RosterKpi {
    /// Weighted cost of all rostered nurses.
    pub total_cost: f64,
    /// Nurse-shift slots used over the week.
    pub headcount: u32,
    /// Nurse-minutes spent on tasks.
    pub task_nurse_minutes: u64,
    /// Fraction of active (task, day) pairs meeting their requirement (0.0..1.0).
    pub coverage_rate: f64,
    /// Average shift utilization over active shift-days (0.0..1.0).
    pub avg_utilization: f64,
    /// Nurses rostered per day.
    pub headcount_by_day: HashMap<Weekday, u32>,
}

impl RosterKpi {
    /// Computes KPIs from a schedule and its roster.
    ///
    /// Entries naming unknown shifts or tasks contribute nothing.
    pub fn calculate(schedule: &Schedule, roster: &Roster) -> Self {
        let weight_of = |name: &str| roster.shift(name).map_or(0.0, |s| s.weight);

        let assigned_cost: f64 = schedule
            .assignments
            .iter()
            .map(|a| weight_of(&a.shift) * f64::from(a.nurse_count))
            .sum();
        let standby_cost: f64 = schedule
            .standby
            .iter()
            .map(|s| weight_of(&s.shift) * f64::from(s.nurse_count))
            .sum();

        let task_nurse_minutes = schedule
            .assignments
            .iter()
            .filter_map(|a| {
                roster
                    .task(&a.task)
                    .map(|t| u64::from(t.duration_min) * u64::from(a.nurse_count))
            })
            .sum();

        let mut active_pairs = 0usize;
        let mut covered_pairs = 0usize;
        for day in Weekday::ALL {
            for t in roster.tasks_on(day) {
                let task = &roster.tasks()[t];
                active_pairs += 1;
                if schedule.covered(&task.name, day) >= task.nurses_required {
                    covered_pairs += 1;
                }
            }
        }
        let coverage_rate = if active_pairs == 0 {
            1.0
        } else {
            covered_pairs as f64 / active_pairs as f64
        };

        let utilization = shift_utilization(roster, schedule);
        let avg_utilization = if utilization.is_empty() {
            0.0
        } else {
            utilization.iter().map(|u| u.utilization).sum::<f64>() / utilization.len() as f64
        };

        let headcount_by_day = Weekday::ALL
            .into_iter()
            .map(|day| (day, schedule.day_headcount(day)))
            .filter(|&(_, n)| n > 0)
            .collect();

        Self {
            total_cost: assigned_cost + standby_cost,
            headcount: schedule.headcount(),
            task_nurse_minutes,
            coverage_rate,
            avg_utilization,
            headcount_by_day,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_cost: f64, min_coverage_rate: f64) -> bool {
        self.total_cost <= max_cost && self.coverage_rate >= min_coverage_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, DaySet, Shift, Standby, Task, TimeOfDay};

    fn t(h: u32) -> TimeOfDay {
        TimeOfDay::hm(h, 0).unwrap()
    }

    fn roster() -> Roster {
        let days = DaySet::of(&[Weekday::Monday, Weekday::Tuesday]);
        Roster::new(
            vec![Task::new("Rounds", t(9), t(11))
                .with_nurses(2)
                .with_duration(90)
                .on_days(days)],
            vec![Shift::new("Day", t(8), t(16), 4).with_weight(1.5).on_days(days)],
        )
        .unwrap()
    }

    #[test]
    fn test_kpi_basic() {
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new("Day", "Rounds", Weekday::Monday, 2));
        schedule.add_standby(Standby::new("Day", Weekday::Monday, 1));

        let kpi = RosterKpi::calculate(&schedule, &roster());
        assert!((kpi.total_cost - 4.5).abs() < 1e-9);
        assert_eq!(kpi.headcount, 3);
        assert_eq!(kpi.task_nurse_minutes, 180);
        assert!((kpi.coverage_rate - 0.5).abs() < 1e-9); // Tuesday uncovered
        assert!((kpi.avg_utilization - 0.375).abs() < 1e-9); // (3/4 + 0/4) / 2
        assert_eq!(kpi.headcount_by_day.get(&Weekday::Monday), Some(&3));
        assert_eq!(kpi.headcount_by_day.get(&Weekday::Tuesday), None);
    }

    #[test]
    fn test_meets_thresholds() {
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new("Day", "Rounds", Weekday::Monday, 2));
        schedule.add_assignment(Assignment::new("Day", "Rounds", Weekday::Tuesday, 2));

        let kpi = RosterKpi::calculate(&schedule, &roster());
        assert!(kpi.meets_thresholds(6.0, 1.0));
        assert!(!kpi.meets_thresholds(5.0, 1.0));
    }

    #[test]
    fn test_empty_schedule() {
        let kpi = RosterKpi::calculate(&Schedule::new(), &roster());
        assert_eq!(kpi.headcount, 0);
        assert_eq!(kpi.total_cost, 0.0);
        assert_eq!(kpi.coverage_rate, 0.0);
    }
}
