use std::collections::{HashSet, VecDeque};

use derivative::Derivative;
use log::debug;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{
    error::SeatingError,
    operators::Perturbation,
    plan::{PlanKey, SeatingPlan},
};

use super::{Problem, Score, Solver, SolverRng};

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct TabuConfig {
    /// How many recently visited plans stay forbidden.
    #[derivative(Default(value = "5"))]
    pub tenure: usize,
    #[derivative(Default(value = "1000"))]
    pub max_iterations: usize,
    /// Swap candidates generated per iteration.
    #[derivative(Default(value = "10"))]
    pub neighborhood_size: usize,
}

/// Best-neighbour search with a short-term memory of visited plans.
///
/// Membership is by [`PlanKey`], so a plan reached again through a different sequence of
/// swaps is still recognised.
#[derive(Derivative, Clone)]
#[derivative(Default)]
pub struct Tabu {
    config: TabuConfig,
    problem_id: String,
    #[derivative(Default(value = "SolverRng::seed_from_u64(0)"))]
    rng: SolverRng,

    current: SeatingPlan,
    current_score: Score,
    best: SeatingPlan,
    best_score: Score,

    tabu_queue: VecDeque<PlanKey>,
    tabu_set: HashSet<PlanKey>,
    iteration: usize,
    blocked: usize,
}

impl Tabu {
    pub fn new(config: TabuConfig) -> Self {
        Tabu {
            config,
            ..Default::default()
        }
    }

    pub fn tabu_len(&self) -> usize {
        self.tabu_queue.len()
    }

    pub fn is_tabu(&self, plan: &SeatingPlan) -> bool {
        self.tabu_set.contains(&plan.key())
    }

    fn make_tabu(&mut self, key: PlanKey) {
        if self.tabu_set.insert(key.clone()) {
            self.tabu_queue.push_back(key);
        }
        while self.tabu_queue.len() > self.config.tenure {
            if let Some(oldest) = self.tabu_queue.pop_front() {
                self.tabu_set.remove(&oldest);
            }
        }
    }
}

impl Solver for Tabu {
    fn name(&self) -> String {
        "tabu".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        self.current = problem.starting_plan(plan, &mut rng)?;
        self.rng = rng;
        self.problem_id = problem.id.clone();
        self.current_score = self.current.score();
        self.best = self.current.clone();
        self.best_score = self.current_score;
        self.tabu_queue.clear();
        self.tabu_set.clear();
        self.iteration = 0;
        self.blocked = 0;
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        if self.iteration >= self.config.max_iterations {
            return Ok(true);
        }
        self.iteration += 1;

        let mut chosen: Option<(SeatingPlan, PlanKey, Score)> = None;
        for _ in 0..self.config.neighborhood_size {
            let candidate = Perturbation::Swap.apply(&self.current, &mut self.rng);
            let key = candidate.key();
            if self.tabu_set.contains(&key) {
                continue;
            }
            let score = candidate.score();
            if chosen.as_ref().map_or(true, |(_, _, best)| score > *best) {
                chosen = Some((candidate, key, score));
            }
        }

        match chosen {
            Some((candidate, key, score)) => {
                self.current = candidate;
                self.current_score = score;
                if score > self.best_score {
                    self.best = self.current.clone();
                    self.best_score = score;
                }
                self.make_tabu(key);
            }
            None => self.blocked += 1,
        }

        let done = self.iteration >= self.config.max_iterations;
        if done {
            debug!(
                "tabu({}): best {} after {} iterations, {} fully tabu neighbourhoods",
                self.problem_id, self.best_score.0, self.iteration, self.blocked
            );
        }
        Ok(done)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        Some((&self.best, self.best_score))
    }
}
