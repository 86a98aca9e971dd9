//! Open-source backend: branch and bound over `good_lp` LP relaxations,
//! each solved by the pure-Rust `microlp` solver.
//!
//! # Algorithm
//!
//! Depth-first branch and bound:
//! 1. Solve the LP relaxation of the node (variable bounds narrowed by the
//!    branching decisions so far).
//! 2. Prune when the relaxation is infeasible or cannot beat the incumbent.
//! 3. If every value is integral, the point becomes the incumbent.
//! 4. Otherwise branch on the most fractional variable, exploring the
//!    nearer rounding first.
//!
//! The deadline is checked before every node, so the search stops within
//! one LP solve of the budget and runs on the caller's thread.
//!
//! # Complexity
//! Exponential in the worst case; the coverage and capacity rows are
//! close to totally unimodular, so most rosters close at the root.

use std::time::{Duration, Instant};

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use log::{debug, warn};

use super::backend::{BackendOutcome, RawSolution, SolverBackend};
use crate::compiler::{CompiledModel, Sense};
use crate::error::{Result, SchedulingError};
use crate::projection::INTEGRALITY_TOLERANCE;

/// Branch-and-bound search on `microlp` relaxations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

impl MicrolpBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    fn solve(&self, model: &CompiledModel, time_limit: Duration) -> Result<BackendOutcome> {
        // `None` when the budget is beyond what `Instant` can represent.
        let deadline = Instant::now().checked_add(time_limit);
        let mut stack = vec![Node {
            lower: vec![0.0; model.num_variables()],
            upper: model
                .variables()
                .iter()
                .map(|v| f64::from(v.upper))
                .collect(),
        }];
        let mut best: Option<RawSolution> = None;
        let mut nodes = 0usize;

        while let Some(node) = stack.pop() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    "microlp: budget of {:.3}s spent after {} node(s), {} open",
                    time_limit.as_secs_f64(),
                    nodes,
                    stack.len() + 1
                );
                return Ok(best.map_or(BackendOutcome::NoSolution, BackendOutcome::Feasible));
            }
            nodes += 1;

            let Some(values) = relax(model, &node)? else {
                continue;
            };
            let bound = model.objective_value(&values);
            if best
                .as_ref()
                .is_some_and(|b| bound >= b.objective - INTEGRALITY_TOLERANCE)
            {
                continue;
            }

            match most_fractional(&values) {
                None => {
                    let rounded: Vec<f64> = values.iter().map(|v| v.round().max(0.0)).collect();
                    if model.is_feasible(&rounded) {
                        best = Some(RawSolution::evaluated(model, rounded));
                    }
                }
                Some(j) => {
                    let (down, up) = node.branch(j, values[j]);
                    // Nearer rounding on top of the stack.
                    if values[j] - values[j].floor() < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                }
            }
        }

        debug!("microlp: search closed after {} node(s)", nodes);
        Ok(best.map_or(BackendOutcome::Infeasible, BackendOutcome::Optimal))
    }
}

/// Variable bounds of one search node.
#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Node {
    /// Splits on `x[j] <= floor(value)` and `x[j] >= ceil(value)`.
    fn branch(self, j: usize, value: f64) -> (Node, Node) {
        let mut down = self.clone();
        down.upper[j] = value.floor();
        let mut up = self;
        up.lower[j] = value.ceil();
        (down, up)
    }
}

/// Index of the value farthest from an integer, if any is fractional.
fn most_fractional(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .map(|(j, v)| (j, (v - v.round()).abs()))
        .filter(|&(_, gap)| gap > INTEGRALITY_TOLERANCE)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(j, _)| j)
}

/// Solves the LP relaxation of `node`. `None` when it is infeasible.
fn relax(model: &CompiledModel, node: &Node) -> Result<Option<Vec<f64>>> {
    let mut vars = ProblemVariables::new();
    let xs: Vec<Variable> = node
        .lower
        .iter()
        .zip(&node.upper)
        .map(|(&lo, &hi)| vars.add(variable().min(lo).max(hi)))
        .collect();

    let objective: Expression = model
        .objective()
        .terms()
        .map(|(id, coef)| coef * xs[id.index()])
        .sum();
    let mut problem = vars.minimise(objective).using(microlp);

    for row in model.constraints().iter().filter(|c| !c.is_constant()) {
        let lhs: Expression = row
            .terms
            .iter()
            .map(|&(id, coef)| coef * xs[id.index()])
            .sum();
        let rhs = row.rhs;
        match row.sense {
            Sense::AtLeast => problem.add_constraint(constraint!(lhs >= rhs)),
            Sense::AtMost => problem.add_constraint(constraint!(lhs <= rhs)),
        };
    }

    match problem.solve() {
        Ok(solution) => Ok(Some(xs.iter().map(|&x| solution.value(x)).collect())),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(ResolutionError::Unbounded) => Err(SchedulingError::Backend(
            "microlp reported an unbounded relaxation".into(),
        )),
        Err(other) => Err(SchedulingError::Backend(format!("microlp: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ModelCompiler;
    use crate::config::ObjectiveKind;
    use crate::models::{DaySet, Roster, Shift, Task, TimeOfDay, Weekday};
    use crate::objective::ObjectiveBuilder;

    fn t(h: u32) -> TimeOfDay {
        TimeOfDay::hm(h, 0).unwrap()
    }

    fn compiled(roster: &Roster, min: u32) -> CompiledModel {
        let mut model = ModelCompiler::new(roster)
            .with_min_nurses_per_day(min)
            .compile();
        ObjectiveBuilder::new(ObjectiveKind::MinimizeCost).apply(roster, &mut model);
        model
    }

    #[test]
    fn test_prefers_cheaper_shift() {
        let monday = DaySet::of(&[Weekday::Monday]);
        let roster = Roster::new(
            vec![Task::new("Rounds", t(9), t(11)).with_nurses(3).on_days(monday)],
            vec![
                Shift::new("Cheap", t(8), t(16), 2).with_weight(1.0).on_days(monday),
                Shift::new("Premium", t(8), t(16), 2).with_weight(3.0).on_days(monday),
            ],
        )
        .unwrap();
        let model = compiled(&roster, 0);

        let outcome = MicrolpBackend::new()
            .solve(&model, Duration::from_secs(10))
            .unwrap();
        let BackendOutcome::Optimal(solution) = outcome else {
            panic!("expected optimal, got {outcome:?}");
        };
        assert!((solution.objective - 5.0).abs() < 1e-6);
        let cheap = model.assignment_var(0, 0, Weekday::Monday).unwrap();
        assert!((solution.values[cheap.index()] - 2.0).abs() < 1e-6);
        assert!(model.is_feasible(&solution.values));
    }

    #[test]
    fn test_reports_infeasible() {
        let monday = DaySet::of(&[Weekday::Monday]);
        let roster = Roster::new(
            vec![
                Task::new("A", t(9), t(10)).with_nurses(2).on_days(monday),
                Task::new("B", t(10), t(11)).with_nurses(2).on_days(monday),
            ],
            vec![Shift::new("Day", t(8), t(16), 3).on_days(monday)],
        )
        .unwrap();
        let model = compiled(&roster, 0);

        let outcome = MicrolpBackend::new()
            .solve(&model, Duration::from_secs(10))
            .unwrap();
        assert_eq!(outcome, BackendOutcome::Infeasible);
    }

    #[test]
    fn test_spent_budget_stops_before_searching() {
        let roster = Roster::new(
            vec![Task::new("Rounds", t(9), t(11)).with_nurses(2)],
            vec![Shift::new("Day", t(8), t(16), 3)],
        )
        .unwrap();
        let model = compiled(&roster, 3);

        let started = Instant::now();
        let outcome = MicrolpBackend::new().solve(&model, Duration::ZERO).unwrap();
        assert_eq!(outcome, BackendOutcome::NoSolution);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_branches_to_integral_optimum() {
        // Odd daily minimum split across two equal shifts.
        let monday = DaySet::of(&[Weekday::Monday]);
        let roster = Roster::new(
            vec![],
            vec![
                Shift::new("Early", t(6), t(14), 2).on_days(monday),
                Shift::new("Late", t(14), t(22), 2).on_days(monday),
            ],
        )
        .unwrap();
        let model = compiled(&roster, 3);

        let outcome = MicrolpBackend::new()
            .solve(&model, Duration::from_secs(10))
            .unwrap();
        let BackendOutcome::Optimal(solution) = outcome else {
            panic!("expected optimal, got {outcome:?}");
        };
        assert!((solution.objective - 3.0).abs() < 1e-6);
        assert!(solution.values.iter().all(|v| (v - v.round()).abs() < 1e-9));
    }

    #[test]
    fn test_most_fractional() {
        assert_eq!(most_fractional(&[1.0, 2.0, 0.0]), None);
        assert_eq!(most_fractional(&[1.2, 0.5, 2.9]), Some(1));
    }
}
