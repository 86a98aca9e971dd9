//! Shift/task eligibility.
//!
//! Decides whether nurses from a shift can count toward a task. The rule
//! depends on the [`OverlapPolicy`]; break exclusivity applies under every
//! policy.

use crate::config::OverlapPolicy;
use crate::models::{Shift, Task, Weekday};

/// Whether `shift` may cover `task`, ignoring active days.
///
/// # Rules
/// - A task lying entirely inside the shift's break is never eligible.
/// - [`OverlapPolicy::Containment`]: the task window lies inside the shift
///   window.
/// - [`OverlapPolicy::Partial`]: the task window intersects one of the
///   shift's availability pieces (window minus break) for a positive length.
/// - [`OverlapPolicy::Placement`]: some placement `[s, s + duration)` with
///   `s` in `[task.start, task.end - duration]` lies inside one availability
///   piece, i.e. the piece shares at least `duration` minutes with the task
///   window.
pub fn is_eligible(task: &Task, shift: &Shift, policy: OverlapPolicy) -> bool {
    if shift.has_break() && shift.break_window.contains(&task.window) {
        return false;
    }
    match policy {
        OverlapPolicy::Containment => shift.window.contains(&task.window),
        OverlapPolicy::Partial => shift
            .availability()
            .iter()
            .any(|piece| piece.overlaps(&task.window)),
        OverlapPolicy::Placement => shift
            .availability()
            .iter()
            .any(|piece| piece.overlap_min(&task.window) >= task.duration_min.max(1)),
    }
}

/// Whether `shift` may cover `task` on `day` (both active that day).
pub fn is_eligible_on(task: &Task, shift: &Shift, day: Weekday, policy: OverlapPolicy) -> bool {
    task.is_active_on(day) && shift.is_active_on(day) && is_eligible(task, shift, policy)
}

/// Indices of shifts that may cover `task` on `day`.
pub fn eligible_shifts(
    task: &Task,
    shifts: &[Shift],
    day: Weekday,
    policy: OverlapPolicy,
) -> Vec<usize> {
    shifts
        .iter()
        .enumerate()
        .filter(|(_, shift)| is_eligible_on(task, shift, day, policy))
        .map(|(i, _)| i)
        .collect()
}
