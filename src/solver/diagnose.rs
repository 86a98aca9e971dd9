//! Infeasibility diagnosis.
//!
//! Explains why a roster cannot be covered, in terms of the constraint
//! class that fails. The checks are exact for this model: a roster is
//! feasible if and only if [`diagnose`] returns nothing.
//!
//! # Checks (per day)
//! 1. Coverage: a task's eligible shifts cannot supply its requirement even
//!    on their own (`Σ min(max_nurses, required) < required`).
//! 2. Shared capacity: every task is reachable on its own, but the shifts
//!    cannot serve all tasks at once (bipartite max-flow below demand).
//! 3. Daily minimum: all active shifts at full capacity stay below the
//!    minimum.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::compiler::eligibility;
use crate::config::OverlapPolicy;
use crate::models::{Roster, Weekday};

/// Why a roster admits no schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnosis {
    /// A task cannot be covered by its eligible shifts.
    CoverageShortfall {
        /// Task name.
        task: String,
        /// Day.
        day: Weekday,
        /// Nurses required.
        required: u32,
        /// Nurses the eligible shifts can supply.
        reachable: u64,
    },
    /// Tasks compete for the same shifts and not all can be covered.
    SharedCapacityExceeded {
        /// Day.
        day: Weekday,
        /// Total nurses required that day.
        required: u64,
        /// Most nurses that can be assigned at once.
        assignable: u64,
    },
    /// Active shift capacity is below the daily minimum.
    DailyMinimumUnreachable {
        /// Day.
        day: Weekday,
        /// Required minimum.
        minimum: u32,
        /// Total capacity of active shifts.
        capacity: u64,
    },
}

impl Diagnosis {
    /// Day on which the problem occurs.
    pub fn day(&self) -> Weekday {
        match self {
            Diagnosis::CoverageShortfall { day, .. }
            | Diagnosis::SharedCapacityExceeded { day, .. }
            | Diagnosis::DailyMinimumUnreachable { day, .. } => *day,
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::CoverageShortfall {
                task,
                day,
                required,
                reachable,
            } => write!(
                f,
                "coverage constraint for task '{task}' on {day} unsatisfiable: \
                 needs {required} nurse(s), eligible shifts supply at most {reachable}"
            ),
            Diagnosis::SharedCapacityExceeded {
                day,
                required,
                assignable,
            } => write!(
                f,
                "shift capacity on {day} exceeded: tasks need {required} nurse(s), \
                 at most {assignable} can be assigned"
            ),
            Diagnosis::DailyMinimumUnreachable {
                day,
                minimum,
                capacity,
            } => write!(
                f,
                "daily minimum on {day} unreachable: {minimum} nurse(s) required, \
                 active shifts hold {capacity}"
            ),
        }
    }
}

/// Finds every reason `roster` admits no schedule.
pub fn diagnose(roster: &Roster, overlap: OverlapPolicy, min_nurses_per_day: u32) -> Vec<Diagnosis> {
    let tasks = roster.tasks();
    let shifts = roster.shifts();
    let mut diagnoses = Vec::new();

    // Shifts inactive on a day are flow nodes without incoming arcs.
    let capacities: Vec<u32> = shifts.iter().map(|s| s.max_nurses).collect();

    for day in roster.rostered_days() {
        let day_tasks = roster.tasks_on(day);
        let day_shifts = roster.shifts_on(day);
        let mut task_shortfall = false;

        // edges[i] = (shift index, arc capacity) for task i
        let mut edges: Vec<Vec<(usize, u32)>> = Vec::with_capacity(day_tasks.len());
        for &t in &day_tasks {
            let task = &tasks[t];
            let task_edges: Vec<(usize, u32)> =
                eligibility::eligible_shifts(task, shifts, day, overlap)
                    .into_iter()
                    .map(|s| (s, shifts[s].max_nurses.min(task.nurses_required)))
                    .collect();
            let reachable: u64 = task_edges.iter().map(|&(_, cap)| u64::from(cap)).sum();
            if reachable < u64::from(task.nurses_required) {
                task_shortfall = true;
                diagnoses.push(Diagnosis::CoverageShortfall {
                    task: task.name.clone(),
                    day,
                    required: task.nurses_required,
                    reachable,
                });
            }
            edges.push(task_edges);
        }

        if !task_shortfall && !day_tasks.is_empty() {
            let demands: Vec<u32> = day_tasks.iter().map(|&t| tasks[t].nurses_required).collect();
            let required: u64 = demands.iter().copied().map(u64::from).sum();
            let assignable = max_assignable(&demands, &capacities, &edges);
            if assignable < required {
                diagnoses.push(Diagnosis::SharedCapacityExceeded {
                    day,
                    required,
                    assignable,
                });
            }
        }

        if min_nurses_per_day > 0 {
            let capacity: u64 = day_shifts
                .iter()
                .map(|&s| u64::from(shifts[s].max_nurses))
                .sum();
            if capacity < u64::from(min_nurses_per_day) {
                diagnoses.push(Diagnosis::DailyMinimumUnreachable {
                    day,
                    minimum: min_nurses_per_day,
                    capacity,
                });
            }
        }
    }
    diagnoses
}

/// Maximum flow from tasks (supply `demands`) to shifts (sink capacity
/// `capacities`) over `edges` (Edmonds-Karp).
fn max_assignable(demands: &[u32], capacities: &[u32], edges: &[Vec<(usize, u32)>]) -> u64 {
    // Node layout: 0 = source, 1..=T tasks, T+1..=T+S shifts, T+S+1 = sink.
    let n_tasks = demands.len();
    let n_shifts = capacities.len();
    let source = 0;
    let sink = n_tasks + n_shifts + 1;
    let n = sink + 1;
    let mut residual = vec![vec![0u64; n]; n];

    for (i, &demand) in demands.iter().enumerate() {
        residual[source][1 + i] = u64::from(demand);
        for &(j, cap) in &edges[i] {
            residual[1 + i][1 + n_tasks + j] += u64::from(cap);
        }
    }
    for (j, &cap) in capacities.iter().enumerate() {
        residual[1 + n_tasks + j][sink] = u64::from(cap);
    }

    let mut flow = 0u64;
    loop {
        let mut parent = vec![usize::MAX; n];
        parent[source] = source;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            if u == sink {
                break;
            }
            for v in 0..n {
                if parent[v] == usize::MAX && residual[u][v] > 0 {
                    parent[v] = u;
                    queue.push_back(v);
                }
            }
        }
        if parent[sink] == usize::MAX {
            break;
        }

        let mut bottleneck = u64::MAX;
        let mut v = sink;
        while v != source {
            let u = parent[v];
            bottleneck = bottleneck.min(residual[u][v]);
            v = u;
        }
        let mut v = sink;
        while v != source {
            let u = parent[v];
            residual[u][v] -= bottleneck;
            residual[v][u] += bottleneck;
            v = u;
        }
        flow += bottleneck;
    }
    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySet, Shift, Task, TimeOfDay};

    fn t(h: u32) -> TimeOfDay {
        TimeOfDay::hm(h, 0).unwrap()
    }

    fn monday() -> DaySet {
        DaySet::of(&[Weekday::Monday])
    }

    #[test]
    fn test_feasible_roster_has_no_diagnoses() {
        let roster = Roster::new(
            vec![Task::new("Rounds", t(9), t(11)).with_nurses(2)],
            vec![Shift::new("Day", t(8), t(16), 3)],
        )
        .unwrap();
        assert!(diagnose(&roster, OverlapPolicy::Containment, 3).is_empty());
    }

    #[test]
    fn test_coverage_shortfall() {
        let roster = Roster::new(
            vec![Task::new("T1", t(9), t(17)).with_nurses(2).on_days(monday())],
            vec![Shift::new("S1", t(8), t(16), 3).on_days(monday())],
        )
        .unwrap();
        let diagnoses = diagnose(&roster, OverlapPolicy::Containment, 0);
        assert_eq!(
            diagnoses,
            vec![Diagnosis::CoverageShortfall {
                task: "T1".into(),
                day: Weekday::Monday,
                required: 2,
                reachable: 0,
            }]
        );
        assert!(diagnoses[0]
            .to_string()
            .starts_with("coverage constraint for task 'T1' on Monday"));
        assert!(diagnose(&roster, OverlapPolicy::Partial, 0).is_empty());
    }

    #[test]
    fn test_shared_capacity() {
        let roster = Roster::new(
            vec![
                Task::new("A", t(9), t(10)).with_nurses(2).on_days(monday()),
                Task::new("B", t(13), t(14)).with_nurses(2).on_days(monday()),
            ],
            vec![Shift::new("Day", t(8), t(16), 3).on_days(monday())],
        )
        .unwrap();
        assert_eq!(
            diagnose(&roster, OverlapPolicy::Containment, 0),
            vec![Diagnosis::SharedCapacityExceeded {
                day: Weekday::Monday,
                required: 4,
                assignable: 3,
            }]
        );
    }

    #[test]
    fn test_flow_routes_around_contention() {
        // A fits only Early, B fits both: a naive choice of Early for B
        // would fail, the flow does not.
        let roster = Roster::new(
            vec![
                Task::new("A", t(6), t(7)).with_nurses(2).on_days(monday()),
                Task::new("B", t(9), t(10)).with_nurses(2).on_days(monday()),
            ],
            vec![
                Shift::new("Early", t(6), t(14), 2).on_days(monday()),
                Shift::new("Day", t(8), t(16), 2).on_days(monday()),
            ],
        )
        .unwrap();
        assert!(diagnose(&roster, OverlapPolicy::Containment, 0).is_empty());
    }

    #[test]
    fn test_daily_minimum_unreachable() {
        let roster = Roster::new(
            vec![],
            vec![Shift::new("Day", t(8), t(16), 3).on_days(monday())],
        )
        .unwrap();
        assert_eq!(
            diagnose(&roster, OverlapPolicy::Containment, 5),
            vec![Diagnosis::DailyMinimumUnreachable {
                day: Weekday::Monday,
                minimum: 5,
                capacity: 3,
            }]
        );
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let big = 3_000_000_000;
        let tasks = vec![
            Task::new("A", t(9), t(10)).with_nurses(big).on_days(monday()),
            Task::new("B", t(13), t(14)).with_nurses(big).on_days(monday()),
        ];
        let day = Shift::new("Day", t(8), t(16), big).on_days(monday());

        let roster = Roster::new(tasks.clone(), vec![day.clone()]).unwrap();
        assert_eq!(
            diagnose(&roster, OverlapPolicy::Containment, 0),
            vec![Diagnosis::SharedCapacityExceeded {
                day: Weekday::Monday,
                required: 6_000_000_000,
                assignable: 3_000_000_000,
            }]
        );

        let late = Shift::new("Late", t(12), t(20), big).on_days(monday());
        let roster = Roster::new(tasks, vec![day, late]).unwrap();
        assert!(diagnose(&roster, OverlapPolicy::Containment, u32::MAX).is_empty());
    }

    #[test]
    fn test_max_assignable_direct() {
        let edges = vec![vec![(0, 2), (1, 2)], vec![(1, 1)]];
        assert_eq!(max_assignable(&[2, 1], &[1, 2], &edges), 3);
        assert_eq!(max_assignable(&[2, 2], &[1, 1], &edges), 2);
    }
}
