//! Independent schedule audit.
//!
//! Re-checks a schedule against the roster without consulting the
//! compiled model: references, eligibility, coverage, capacity and the
//! daily minimum.

use crate::compiler::eligibility;
use crate::config::OverlapPolicy;
use crate::models::{Roster, Schedule, Violation, ViolationType, Weekday};

/// Lists every hard-rule violation in `schedule`.
///
/// An empty result means the schedule is valid for `roster` under the
/// given policy and daily minimum.
pub fn audit(
    roster: &Roster,
    schedule: &Schedule,
    overlap: OverlapPolicy,
    min_nurses_per_day: u32,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for a in &schedule.assignments {
        let (Some(task), Some(shift)) = (roster.task(&a.task), roster.shift(&a.shift)) else {
            violations.push(Violation::new(
                ViolationType::UnknownReference,
                format!("{}/{}", a.shift, a.task),
                a.day,
                format!("assignment references unknown shift '{}' or task '{}'", a.shift, a.task),
            ));
            continue;
        };
        if !eligibility::is_eligible_on(task, shift, a.day, overlap) {
            violations.push(Violation::new(
                ViolationType::IneligibleCoverage,
                format!("{}/{}", a.shift, a.task),
                a.day,
                format!(
                    "shift '{}' ({}) cannot cover task '{}' ({}) on {}",
                    shift.name, shift.window, task.name, task.window, a.day
                ),
            ));
        }
    }
    for s in &schedule.standby {
        if !roster.shift(&s.shift).is_some_and(|shift| shift.is_active_on(s.day)) {
            violations.push(Violation::new(
                ViolationType::UnknownReference,
                &s.shift,
                s.day,
                format!("standby on unknown or inactive shift '{}'", s.shift),
            ));
        }
    }

    for day in Weekday::ALL {
        for t in roster.tasks_on(day) {
            let task = &roster.tasks()[t];
            let covered = schedule.covered(&task.name, day);
            if covered < task.nurses_required {
                violations.push(Violation::new(
                    ViolationType::Undercovered,
                    &task.name,
                    day,
                    format!(
                        "task '{}' has {} of {} nurse(s) on {}",
                        task.name, covered, task.nurses_required, day
                    ),
                ));
            }
        }
        for s in roster.shifts_on(day) {
            let shift = &roster.shifts()[s];
            let load = schedule.shift_load(&shift.name, day);
            if load > shift.max_nurses {
                violations.push(Violation::new(
                    ViolationType::CapacityExceeded,
                    &shift.name,
                    day,
                    format!(
                        "shift '{}' uses {} of {} nurse(s) on {}",
                        shift.name, load, shift.max_nurses, day
                    ),
                ));
            }
        }
        if min_nurses_per_day > 0 && roster.rostered_days().contains(&day) {
            let headcount = schedule.day_headcount(day);
            if headcount < min_nurses_per_day {
                violations.push(Violation::new(
                    ViolationType::BelowDailyMinimum,
                    day.to_string(),
                    day,
                    format!(
                        "{} nurse(s) rostered on {}, minimum is {}",
                        headcount, day, min_nurses_per_day
                    ),
                ));
            }
        }
    }
    violations
}
