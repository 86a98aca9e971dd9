//! Integer model formulation.
//!
//! Translates a validated [`Roster`] into a solver-neutral integer linear
//! model ([`CompiledModel`]). Backends read this representation and never
//! see domain types.
//!
//! # Formulation
//!
//! | Item | Definition |
//! |------|-----------|
//! | `x[s, t, d]` | nurses of shift `s` covering task `t` on day `d`, `0..=min(max_nurses, nurses_required)` |
//! | `y[s, d]` | standby nurses of shift `s` on day `d`, `0..=max_nurses` (only with a daily minimum) |
//! | Coverage | `Σ_s x[s, t, d] ≥ nurses_required` per active (task, day) |
//! | Capacity | `Σ_t x[s, t, d] + y[s, d] ≤ max_nurses` per active (shift, day) |
//! | Daily minimum | `Σ x[·, ·, d] + Σ y[·, d] ≥ min_nurses_per_day` per rostered day |
//!
//! Assignment variables exist only for eligible (shift, task) pairs active
//! on the same day (see [`eligibility`]). Rows are emitted even when their
//! left side is empty, so that an uncoverable task shows up as an
//! unsatisfiable row instead of disappearing.

pub mod eligibility;

use std::collections::HashMap;
use std::fmt;

use crate::config::OverlapPolicy;
use crate::models::{Roster, Weekday};
use crate::objective::LinearObjective;

/// Tolerance used when checking rows against candidate values.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Index of a variable in a [`CompiledModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    /// Position in the model's variable list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// What a variable counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Nurses of a shift covering a task on a day.
    Assignment {
        /// Shift index in the roster.
        shift: usize,
        /// Task index in the roster.
        task: usize,
        /// Day.
        day: Weekday,
    },
    /// Nurses rostered on a shift-day without a task.
    Standby {
        /// Shift index in the roster.
        shift: usize,
        /// Day.
        day: Weekday,
    },
}

impl VarKind {
    /// Shift index this variable draws from.
    pub fn shift(&self) -> usize {
        match *self {
            VarKind::Assignment { shift, .. } | VarKind::Standby { shift, .. } => shift,
        }
    }

    /// Day this variable belongs to.
    pub fn day(&self) -> Weekday {
        match *self {
            VarKind::Assignment { day, .. } | VarKind::Standby { day, .. } => day,
        }
    }
}

/// A non-negative integer decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Identifier (position in the model).
    pub id: VarId,
    /// What the variable counts.
    pub kind: VarKind,
    /// Inclusive upper bound (lower bound is always 0).
    pub upper: u32,
}

/// Direction of a linear row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `lhs ≥ rhs`
    AtLeast,
    /// `lhs ≤ rhs`
    AtMost,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::AtLeast => write!(f, ">="),
            Sense::AtMost => write!(f, "<="),
        }
    }
}

/// Origin of a constraint row, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintClass {
    /// Task coverage on a day.
    Coverage {
        /// Task index.
        task: usize,
        /// Day.
        day: Weekday,
    },
    /// Shift capacity on a day.
    Capacity {
        /// Shift index.
        shift: usize,
        /// Day.
        day: Weekday,
    },
    /// Minimum nurses on a day.
    DailyMinimum {
        /// Day.
        day: Weekday,
    },
}

impl ConstraintClass {
    /// Day the row applies to.
    pub fn day(&self) -> Weekday {
        match *self {
            ConstraintClass::Coverage { day, .. }
            | ConstraintClass::Capacity { day, .. }
            | ConstraintClass::DailyMinimum { day } => day,
        }
    }

    /// Human-readable description with roster names.
    pub fn describe(&self, roster: &Roster) -> String {
        match *self {
            ConstraintClass::Coverage { task, day } => format!(
                "coverage of task '{}' on {}",
                roster.tasks().get(task).map_or("?", |t| t.name.as_str()),
                day
            ),
            ConstraintClass::Capacity { shift, day } => format!(
                "capacity of shift '{}' on {}",
                roster.shifts().get(shift).map_or("?", |s| s.name.as_str()),
                day
            ),
            ConstraintClass::DailyMinimum { day } => format!("daily minimum on {day}"),
        }
    }
}

/// A linear row `Σ coef × var (sense) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Origin of the row.
    pub class: ConstraintClass,
    /// Left-hand side terms.
    pub terms: Vec<(VarId, f64)>,
    /// Direction.
    pub sense: Sense,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Whether the left side has no variables.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Left-hand side value under `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(id, coef)| coef * values.get(id.index()).copied().unwrap_or(0.0))
            .sum()
    }

    /// Whether the row holds under `values`.
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::AtLeast => lhs >= self.rhs - FEASIBILITY_TOLERANCE,
            Sense::AtMost => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
        }
    }
}

/// Solver-neutral integer linear model of one roster.
#[derive(Debug, Clone, Default)]
pub struct CompiledModel {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearObjective,
    index: HashMap<VarKind, VarId>,
}

impl CompiledModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable and returns its id.
    pub fn add_variable(&mut self, kind: VarKind, upper: u32) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable { id, kind, upper });
        self.index.insert(kind, id);
        id
    }

    /// Adds a constraint row.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Replaces the objective.
    pub fn set_objective(&mut self, objective: LinearObjective) {
        self.objective = objective;
    }

    /// All variables, in id order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All constraint rows.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective to minimise.
    pub fn objective(&self) -> &LinearObjective {
        &self.objective
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Looks up a variable.
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    /// Id of `x[shift, task, day]`, if that triple is eligible.
    pub fn assignment_var(&self, shift: usize, task: usize, day: Weekday) -> Option<VarId> {
        self.index
            .get(&VarKind::Assignment { shift, task, day })
            .copied()
    }

    /// Id of the standby variable of `shift` on `day`, if any.
    pub fn standby_var(&self, shift: usize, day: Weekday) -> Option<VarId> {
        self.index.get(&VarKind::Standby { shift, day }).copied()
    }

    /// Rows violated by `values`.
    pub fn violated(&self, values: &[f64]) -> Vec<&LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values))
            .collect()
    }

    /// Whether `values` respects every bound and row.
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        values.len() == self.variables.len()
            && self.variables.iter().all(|v| {
                let value = values[v.id.index()];
                value >= -FEASIBILITY_TOLERANCE
                    && value <= f64::from(v.upper) + FEASIBILITY_TOLERANCE
            })
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }

    /// Objective value of `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }
}

/// Builds a [`CompiledModel`] from a roster.
///
/// # Example
/// ```
/// use u_roster::compiler::ModelCompiler;
/// use u_roster::models::{Roster, Shift, Task, TimeOfDay};
///
/// let t = |h| TimeOfDay::hm(h, 0).unwrap();
/// let roster = Roster::new(
///     vec![Task::new("Rounds", t(9), t(11)).with_nurses(2)],
///     vec![Shift::new("Day", t(8), t(16), 3)],
/// ).unwrap();
///
/// let model = ModelCompiler::new(&roster).compile();
/// assert_eq!(model.num_variables(), 7); // one per weekday
/// ```
#[derive(Debug, Clone)]
pub struct ModelCompiler<'a> {
    roster: &'a Roster,
    overlap: OverlapPolicy,
    min_nurses_per_day: u32,
}

impl<'a> ModelCompiler<'a> {
    /// Creates a compiler with the default overlap policy and no daily minimum.
    pub fn new(roster: &'a Roster) -> Self {
        Self {
            roster,
            overlap: OverlapPolicy::default(),
            min_nurses_per_day: 0,
        }
    }

    /// Sets the overlap policy.
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sets the minimum nurses per rostered day.
    pub fn with_min_nurses_per_day(mut self, min: u32) -> Self {
        self.min_nurses_per_day = min;
        self
    }

    /// Builds the model (variables and rows; the objective is left empty).
    ///
    /// Variables are numbered day by day, shift by shift, task by task, so
    /// the same roster always yields the same model.
    pub fn compile(&self) -> CompiledModel {
        let mut model = CompiledModel::new();
        let tasks = self.roster.tasks();
        let shifts = self.roster.shifts();

        for day in Weekday::ALL {
            let day_tasks = self.roster.tasks_on(day);
            let day_shifts = self.roster.shifts_on(day);

            for &s in &day_shifts {
                let shift = &shifts[s];
                for &t in &day_tasks {
                    let task = &tasks[t];
                    if eligibility::is_eligible(task, shift, self.overlap) {
                        let upper = shift.max_nurses.min(task.nurses_required);
                        model.add_variable(VarKind::Assignment { shift: s, task: t, day }, upper);
                    }
                }
                if self.min_nurses_per_day > 0 {
                    model.add_variable(VarKind::Standby { shift: s, day }, shift.max_nurses);
                }
            }

            for &t in &day_tasks {
                let terms = day_shifts
                    .iter()
                    .filter_map(|&s| model.assignment_var(s, t, day))
                    .map(|id| (id, 1.0))
                    .collect();
                model.add_constraint(LinearConstraint {
                    class: ConstraintClass::Coverage { task: t, day },
                    terms,
                    sense: Sense::AtLeast,
                    rhs: f64::from(tasks[t].nurses_required),
                });
            }

            for &s in &day_shifts {
                let terms = day_tasks
                    .iter()
                    .filter_map(|&t| model.assignment_var(s, t, day))
                    .chain(model.standby_var(s, day))
                    .map(|id| (id, 1.0))
                    .collect();
                model.add_constraint(LinearConstraint {
                    class: ConstraintClass::Capacity { shift: s, day },
                    terms,
                    sense: Sense::AtMost,
                    rhs: f64::from(shifts[s].max_nurses),
                });
            }

            let rostered = !day_tasks.is_empty() || !day_shifts.is_empty();
            if self.min_nurses_per_day > 0 && rostered {
                let terms = model
                    .variables()
                    .iter()
                    .filter(|v| v.kind.day() == day)
                    .map(|v| (v.id, 1.0))
                    .collect();
                model.add_constraint(LinearConstraint {
                    class: ConstraintClass::DailyMinimum { day },
                    terms,
                    sense: Sense::AtLeast,
                    rhs: f64::from(self.min_nurses_per_day),
                });
            }
        }

        log::debug!(
            "compiled model: {} variables, {} constraints ({:?}, min/day {})",
            model.num_variables(),
            model.num_constraints(),
            self.overlap,
            self.min_nurses_per_day
        );
        model
    }
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

    fn sample_roster() -> Roster {
        Roster::new(
            vec![
                Task::new("Rounds", t(9), t(11)).with_nurses(2).on_days(monday()),
                Task::new("Meds", t(14), t(15)).on_days(monday()),
            ],
            vec![
                Shift::new("Early", t(7), t(15), 3).on_days(monday()),
                Shift::new("Late", t(13), t(21), 1).on_days(monday()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_variables_only_for_eligible_pairs() {
        let roster = sample_roster();
        let model = ModelCompiler::new(&roster).compile();

        // Early covers both tasks, Late only Meds.
        assert_eq!(model.num_variables(), 3);
        assert!(model.assignment_var(0, 0, Weekday::Monday).is_some());
        assert!(model.assignment_var(1, 0, Weekday::Monday).is_none());
        assert!(model.assignment_var(1, 1, Weekday::Monday).is_some());
        assert!(model.standby_var(0, Weekday::Monday).is_none());

        let x = model.assignment_var(1, 1, Weekday::Monday).unwrap();
        assert_eq!(model.variable(x).unwrap().upper, 1);
        let x = model.assignment_var(0, 0, Weekday::Monday).unwrap();
        assert_eq!(model.variable(x).unwrap().upper, 2);
    }

    #[test]
    fn test_rows_per_active_pair() {
        let roster = sample_roster();
        let model = ModelCompiler::new(&roster).compile();

        // 2 coverage + 2 capacity rows, Monday only.
        assert_eq!(model.num_constraints(), 4);
        let coverage = &model.constraints()[0];
        assert_eq!(
            coverage.class,
            ConstraintClass::Coverage { task: 0, day: Weekday::Monday }
        );
        assert_eq!(coverage.sense, Sense::AtLeast);
        assert_eq!(coverage.rhs, 2.0);
        assert_eq!(coverage.terms.len(), 1);
    }

    #[test]
    fn test_uncoverable_task_keeps_empty_row() {
        let roster = Roster::new(
            vec![Task::new("Night watch", t(22), t(23)).on_days(monday())],
            vec![Shift::new("Day", t(8), t(16), 3).on_days(monday())],
        )
        .unwrap();
        let model = ModelCompiler::new(&roster).compile();

        assert_eq!(model.num_variables(), 0);
        let row = &model.constraints()[0];
        assert!(row.is_constant());
        assert!(!row.is_satisfied(&[]));
        assert_eq!(model.violated(&[]).len(), 1);
    }

    #[test]
    fn test_daily_minimum_adds_standby() {
        let roster = sample_roster();
        let model = ModelCompiler::new(&roster)
            .with_min_nurses_per_day(4)
            .compile();

        assert_eq!(model.num_variables(), 5);
        let standby = model.standby_var(1, Weekday::Monday).unwrap();
        assert_eq!(model.variable(standby).unwrap().upper, 1);

        let minimum = model
            .constraints()
            .iter()
            .find(|c| matches!(c.class, ConstraintClass::DailyMinimum { .. }))
            .unwrap();
        assert_eq!(minimum.terms.len(), 5);
        assert_eq!(minimum.rhs, 4.0);

        let capacity = model
            .constraints()
            .iter()
            .find(|c| c.class == ConstraintClass::Capacity { shift: 1, day: Weekday::Monday })
            .unwrap();
        assert_eq!(capacity.terms.len(), 2);
    }

    #[test]
    fn test_daily_minimum_skips_empty_days() {
        let roster = sample_roster();
        let model = ModelCompiler::new(&roster)
            .with_min_nurses_per_day(1)
            .compile();
        assert!(model
            .constraints()
            .iter()
            .all(|c| c.class.day() == Weekday::Monday));
    }

    #[test]
    fn test_feasibility_check() {
        let roster = sample_roster();
        let model = ModelCompiler::new(&roster).compile();
        let rounds = model.assignment_var(0, 0, Weekday::Monday).unwrap();
        let meds_late = model.assignment_var(1, 1, Weekday::Monday).unwrap();

        let mut values = vec![0.0; model.num_variables()];
        assert!(!model.is_feasible(&values));
        values[rounds.index()] = 2.0;
        values[meds_late.index()] = 1.0;
        assert!(model.is_feasible(&values));
        values[meds_late.index()] = 2.0; // above bound
        assert!(!model.is_feasible(&values));
    }

    #[test]
    fn test_partial_policy_adds_variables() {
        let roster = Roster::new(
            vec![Task::new("T1", t(9), t(17)).with_nurses(2)],
            vec![Shift::new("S1", t(8), t(16), 3)],
        )
        .unwrap();
        let contained = ModelCompiler::new(&roster).compile();
        let partial = ModelCompiler::new(&roster)
            .with_overlap(OverlapPolicy::Partial)
            .compile();
        assert_eq!(contained.num_variables(), 0);
        assert_eq!(partial.num_variables(), 7);
    }

    #[test]
    fn test_class_description() {
        let roster = sample_roster();
        let class = ConstraintClass::Coverage { task: 1, day: Weekday::Monday };
        assert_eq!(class.describe(&roster), "coverage of task 'Meds' on Monday");
        let class = ConstraintClass::DailyMinimum { day: Weekday::Friday };
        assert_eq!(class.describe(&roster), "daily minimum on Friday");
    }
}
