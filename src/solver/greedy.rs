//! Greedy incumbent construction.
//!
//! Builds a feasible point before the exact search so a time-out can still
//! return a schedule.
//!
//! # Algorithm
//!
//! For each day:
//! 1. Order coverage rows (most constrained first: fewest candidate
//!    variables, then largest requirement).
//! 2. Fill each requirement from its cheapest candidates, limited by the
//!    variable bound and the shift's remaining capacity.
//! 3. Top the day up to the daily minimum with the cheapest standby
//!    variables.
//!
//! Restarts shuffle the row order and break cost ties at random, using a
//! seeded generator so runs are reproducible. Every candidate is checked
//! against the full model before it is accepted.
//!
//! # Complexity
//! O(r · (k log k)) per pass, r = coverage rows, k = candidates per row.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::backend::RawSolution;
use crate::compiler::{CompiledModel, ConstraintClass, VarId, VarKind};
use crate::models::Weekday;

/// Seeded multi-start greedy heuristic.
#[derive(Debug, Clone)]
pub struct GreedyIncumbent {
    restarts: u32,
    seed: u64,
}

struct CoverageRow {
    candidates: Vec<VarId>,
    required: u32,
}

struct DayPlan {
    day: Weekday,
    rows: Vec<CoverageRow>,
    standby: Vec<VarId>,
    minimum: u32,
}

impl GreedyIncumbent {
    /// Creates a heuristic with `restarts` randomised passes after the
    /// deterministic one.
    pub fn new(restarts: u32, seed: u64) -> Self {
        Self { restarts, seed }
    }

    /// Runs all passes and returns the best feasible point.
    ///
    /// `on_improve` is called for every strictly better point, in order.
    pub fn search<F>(&self, model: &CompiledModel, mut on_improve: F) -> Option<RawSolution>
    where
        F: FnMut(&RawSolution),
    {
        let plans = Self::plan(model);
        let costs = Self::costs(model);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<RawSolution> = None;

        for pass in 0..=self.restarts {
            let shuffle = if pass == 0 { None } else { Some(&mut rng) };
            let Some(values) = Self::construct(model, &plans, &costs, shuffle) else {
                continue;
            };
            if !model.is_feasible(&values) {
                continue;
            }
            let candidate = RawSolution::evaluated(model, values);
            let improves = best
                .as_ref()
                .map_or(true, |b| candidate.objective < b.objective - 1e-9);
            if improves {
                on_improve(&candidate);
                best = Some(candidate);
            }
        }
        best
    }

    fn costs(model: &CompiledModel) -> Vec<f64> {
        let mut costs = vec![0.0; model.num_variables()];
        for (id, coef) in model.objective().terms() {
            costs[id.index()] += coef;
        }
        costs
    }

    fn plan(model: &CompiledModel) -> Vec<DayPlan> {
        let mut plans: Vec<DayPlan> = Weekday::ALL
            .into_iter()
            .map(|day| DayPlan {
                day,
                rows: Vec::new(),
                standby: Vec::new(),
                minimum: 0,
            })
            .collect();

        for row in model.constraints() {
            let plan = &mut plans[row.class.day().index()];
            match row.class {
                ConstraintClass::Coverage { .. } => plan.rows.push(CoverageRow {
                    candidates: row.terms.iter().map(|&(id, _)| id).collect(),
                    required: row.rhs.max(0.0) as u32,
                }),
                ConstraintClass::DailyMinimum { .. } => plan.minimum = row.rhs.max(0.0) as u32,
                ConstraintClass::Capacity { .. } => {}
            }
        }
        for var in model.variables() {
            if let VarKind::Standby { day, .. } = var.kind {
                plans[day.index()].standby.push(var.id);
            }
        }
        plans
    }

    fn capacities(model: &CompiledModel) -> HashMap<(usize, Weekday), u32> {
        model
            .constraints()
            .iter()
            .filter_map(|row| match row.class {
                ConstraintClass::Capacity { shift, day } => {
                    Some(((shift, day), row.rhs.max(0.0) as u32))
                }
                _ => None,
            })
            .collect()
    }

    /// One greedy pass. Returns `None` when some requirement cannot be met.
    fn construct(
        model: &CompiledModel,
        plans: &[DayPlan],
        costs: &[f64],
        mut rng: Option<&mut StdRng>,
    ) -> Option<Vec<f64>> {
        let mut values = vec![0u32; model.num_variables()];
        let mut remaining = Self::capacities(model);

        for plan in plans {
            let mut order: Vec<&CoverageRow> = plan.rows.iter().collect();
            match rng.as_deref_mut() {
                Some(rng) => order.shuffle(rng),
                None => order.sort_by(|a, b| {
                    a.candidates
                        .len()
                        .cmp(&b.candidates.len())
                        .then(b.required.cmp(&a.required))
                }),
            }

            let mut day_total = 0u64;
            for row in order {
                let mut candidates = row.candidates.clone();
                if let Some(rng) = rng.as_deref_mut() {
                    candidates.shuffle(rng);
                }
                candidates.sort_by(|a, b| costs[a.index()].total_cmp(&costs[b.index()]));

                let mut need = row.required;
                for id in candidates {
                    if need == 0 {
                        break;
                    }
                    let var = model.variable(id)?;
                    let key = (var.kind.shift(), plan.day);
                    let left = remaining.get(&key).copied().unwrap_or(0);
                    let take = need.min(left).min(var.upper - values[id.index()]);
                    if take > 0 {
                        values[id.index()] += take;
                        remaining.insert(key, left - take);
                        need -= take;
                        day_total += u64::from(take);
                    }
                }
                if need > 0 {
                    return None;
                }
            }

            let minimum = u64::from(plan.minimum);
            if day_total < minimum {
                let mut standby = plan.standby.clone();
                standby.sort_by(|a, b| costs[a.index()].total_cmp(&costs[b.index()]));
                for id in standby {
                    if day_total >= minimum {
                        break;
                    }
                    let deficit = u32::try_from(minimum - day_total).unwrap_or(u32::MAX);
                    let var = model.variable(id)?;
                    let key = (var.kind.shift(), plan.day);
                    let left = remaining.get(&key).copied().unwrap_or(0);
                    let take = deficit.min(left).min(var.upper);
                    values[id.index()] += take;
                    remaining.insert(key, left - take);
                    day_total += u64::from(take);
                }
                if day_total < minimum {
                    return None;
                }
            }
        }

        Some(values.into_iter().map(f64::from).collect())
    }
}
