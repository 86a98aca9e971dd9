//! Objective construction.
//!
//! All objectives are minimised. With [`ObjectiveKind::FeasibilityOnly`] the
//! objective is the constant zero and any feasible point is optimal.

use serde::Serialize;

use crate::compiler::{CompiledModel, VarId};
use crate::config::ObjectiveKind;
use crate::models::Roster;

/// A linear objective `Σ coef × var` (minimised).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinearObjective {
    terms: Vec<(usize, f64)>,
}

impl LinearObjective {
    /// The constant zero objective.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Adds `coef × var`. Zero coefficients are dropped.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var.index(), coef));
        }
    }

    /// Objective terms.
    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|&(i, coef)| (VarId(i), coef))
    }

    /// Whether the objective is constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value under `values` (missing entries count as zero).
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(i, coef)| coef * values.get(i).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Builds the objective for a compiled model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveBuilder {
    kind: ObjectiveKind,
}

impl ObjectiveBuilder {
    /// Creates a builder for `kind`.
    pub fn new(kind: ObjectiveKind) -> Self {
        Self { kind }
    }

    /// Objective kind.
    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    /// Builds the objective over every variable in `model`.
    ///
    /// - `MinimizeCost`: each variable weighs its shift's `weight`.
    /// - `MinimizeHeadcount`: each variable weighs 1.
    /// - `FeasibilityOnly`: no terms.
    pub fn build(&self, roster: &Roster, model: &CompiledModel) -> LinearObjective {
        let mut objective = LinearObjective::zero();
        match self.kind {
            ObjectiveKind::FeasibilityOnly => {}
            ObjectiveKind::MinimizeHeadcount => {
                for var in model.variables() {
                    objective.add_term(var.id, 1.0);
                }
            }
            ObjectiveKind::MinimizeCost => {
                for var in model.variables() {
                    let weight = roster
                        .shifts()
                        .get(var.kind.shift())
                        .map_or(1.0, |s| s.weight);
                    objective.add_term(var.id, weight);
                }
            }
        }
        objective
    }

    /// Builds the objective and installs it in `model`.
    pub fn apply(&self, roster: &Roster, model: &mut CompiledModel) {
        let objective = self.build(roster, model);
        model.set_objective(objective);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ModelCompiler;
    use crate::models::{DaySet, Shift, Task, TimeOfDay, Weekday};

    fn t(h: u32) -> TimeOfDay {
        TimeOfDay::hm(h, 0).unwrap()
    }

    fn roster() -> Roster {
        let monday = DaySet::of(&[Weekday::Monday]);
        Roster::new(
            vec![Task::new("Rounds", t(9), t(11)).with_nurses(2).on_days(monday)],
            vec![
                Shift::new("Cheap", t(8), t(16), 3).with_weight(1.0).on_days(monday),
                Shift::new("Premium", t(8), t(16), 3).with_weight(2.5).on_days(monday),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_minimize_cost_uses_weights() {
        let roster = roster();
        let mut model = ModelCompiler::new(&roster).compile();
        ObjectiveBuilder::new(ObjectiveKind::MinimizeCost).apply(&roster, &mut model);

        let cheap = model.assignment_var(0, 0, Weekday::Monday).unwrap();
        let premium = model.assignment_var(1, 0, Weekday::Monday).unwrap();
        let mut values = vec![0.0; model.num_variables()];
        values[cheap.index()] = 1.0;
        values[premium.index()] = 1.0;
        assert!((model.objective_value(&values) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_minimize_headcount() {
        let roster = roster();
        let model = ModelCompiler::new(&roster).with_min_nurses_per_day(1).compile();
        let objective = ObjectiveBuilder::new(ObjectiveKind::MinimizeHeadcount).build(&roster, &model);

        assert_eq!(objective.terms().count(), model.num_variables());
        assert!(objective.terms().all(|(_, coef)| coef == 1.0));
    }

    #[test]
    fn test_feasibility_only_is_constant() {
        let roster = roster();
        let model = ModelCompiler::new(&roster).compile();
        let objective = ObjectiveBuilder::new(ObjectiveKind::FeasibilityOnly).build(&roster, &model);

        assert!(objective.is_constant());
        assert_eq!(objective.evaluate(&[5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_zero_weight_dropped() {
        let mut objective = LinearObjective::zero();
        objective.add_term(VarId(0), 0.0);
        objective.add_term(VarId(1), 2.0);
        assert_eq!(objective.terms().collect::<Vec<_>>(), vec![(VarId(1), 2.0)]);
    }
}
