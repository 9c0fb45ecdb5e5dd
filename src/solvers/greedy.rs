use derivative::Derivative;
use log::debug;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CapacityError, SeatingError},
    model::{Guest, GuestId},
    plan::SeatingPlan,
    scorer::{self, Affinity},
};

use super::{Problem, Score, Solver, SolverRng};

/// What orders guests before they are seated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreedyKey {
    /// Sum of all outgoing preferences.
    Sum,
    /// Sum of the k highest outgoing preferences.
    TopK(usize),
}

impl Default for GreedyKey {
    fn default() -> Self {
        GreedyKey::TopK(3)
    }
}

impl GreedyKey {
    pub fn of(self, guest: &Guest) -> i64 {
        match self {
            GreedyKey::Sum => guest.preference_sum(),
            GreedyKey::TopK(k) => guest.top_preference_sum(k),
        }
    }
}

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct GreedyConfig {
    pub key: GreedyKey,
    /// How a guest's pull towards a partly filled table is measured.
    pub placement: Affinity,
}

#[derive(Default, Clone)]
pub struct Greedy {
    config: GreedyConfig,
    problem: Problem,
    plan: SeatingPlan,
    queue: PriorityQueue<GuestId, (i64, String)>,
    placed: usize,
    score: Score,
}

impl Greedy {
    pub fn new(config: GreedyConfig) -> Self {
        Greedy {
            config,
            ..Default::default()
        }
    }

    fn table_for(&self, guest: GuestId) -> Option<usize> {
        if self.placed < self.plan.num_tables() {
            return Some(self.placed);
        }
        let roster = self.plan.roster();
        let mut best: Option<(usize, i64)> = None;
        for (idx, table) in self.plan.tables().iter().enumerate() {
            if table.is_full() {
                continue;
            }
            let pull = scorer::affinity(roster, guest, table.guests(), self.config.placement);
            if best.map_or(true, |(_, best_pull)| pull > best_pull) {
                best = Some((idx, pull));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn finished(&self) -> bool {
        self.queue.is_empty() && self.placed == self.problem.roster.len()
    }
}

impl Solver for Greedy {
    fn name(&self) -> String {
        "greedy".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        _rng: SolverRng,
    ) -> Result<(), SeatingError> {
        if plan.is_some() {
            debug!("greedy({}): ignoring the seed plan", problem.id);
        }
        self.problem = problem.clone();
        self.plan = SeatingPlan::empty(
            problem.roster.clone(),
            problem.num_tables,
            problem.table_capacity,
        );
        self.queue = problem
            .roster
            .guests()
            .iter()
            .map(|g| (g.id, (self.config.key.of(g), g.name.clone())))
            .collect();
        self.placed = 0;
        self.score = Score::default();
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        let Some((guest, (key, _))) = self.queue.pop() else {
            return Ok(true);
        };

        let idx = self.table_for(guest).ok_or_else(|| CapacityError {
            guest: self.problem.roster.name(guest).to_owned(),
            seated: self.placed,
            total: self.problem.roster.len(),
        })?;
        self.plan.seat(idx, guest);
        self.placed += 1;
        debug!(
            "greedy({}): {} (key {}) -> table {}, {} guests left",
            self.problem.id,
            self.problem.roster.name(guest),
            key,
            idx,
            self.queue.len()
        );

        if self.queue.is_empty() {
            self.score = self.plan.score();
            return Ok(true);
        }
        Ok(false)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        if self.finished() {
            Some((&self.plan, self.score))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixtures::{four_guests, rng, wedding_problem};

    #[test]
    fn seeds_tables_in_key_order() {
        // TopK(3): Bob 23, Alice 5, then David and Charlie at 0, by name descending.
        let problem = Problem::new("four", Arc::new(four_guests()), 2, 2).unwrap();
        let solution = Greedy::default().solve(&problem, None, rng(0)).unwrap();
        let plan = &solution.plan;
        assert_eq!(plan.table(0).guests(), &[1, 3]);
        assert_eq!(plan.table(1).guests(), &[0, 2]);
        assert_eq!(solution.score, Score(3));
        assert_eq!(solution.history.len(), 1);
    }

    #[test]
    fn produces_a_feasible_plan() {
        let problem = wedding_problem();
        for key in [GreedyKey::Sum, GreedyKey::TopK(1), GreedyKey::TopK(3)] {
            for placement in [Affinity::Directed, Affinity::Mutual] {
                let mut solver = Greedy::new(GreedyConfig { key, placement });
                let solution = solver.solve(&problem, None, rng(0)).unwrap();
                solution.plan.validate().unwrap();
                assert_eq!(solution.score, solution.plan.score());
            }
        }
    }

    #[test]
    fn nothing_is_reported_before_everyone_is_seated() {
        let problem = wedding_problem();
        let mut solver = Greedy::default();
        solver.initialize(&problem, None, rng(0)).unwrap();
        assert!(!solver.solve_step().unwrap());
        assert!(solver.best().is_none());
    }

    #[test]
    fn extra_tables_stay_empty() {
        let problem = Problem::new("four", Arc::new(four_guests()), 6, 2).unwrap();
        let solution = Greedy::default().solve(&problem, None, rng(0)).unwrap();
        solution.plan.validate().unwrap();
        assert_eq!(solution.plan.occupied_tables().len(), 4);
    }
}
