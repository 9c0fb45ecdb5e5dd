use derivative::Derivative;
use log::debug;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{error::SeatingError, operators::Perturbation, plan::SeatingPlan};

use super::{Problem, Score, Solver, SolverRng};

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct ClimberConfig {
    #[derivative(Default(value = "10_000"))]
    pub max_iterations: usize,
}

/// Swap-neighbour hill climbing: a random swap is kept only if it strictly improves the plan.
#[derive(Derivative, Clone)]
#[derivative(Default)]
pub struct Climber {
    config: ClimberConfig,
    problem_id: String,
    #[derivative(Default(value = "SolverRng::seed_from_u64(0)"))]
    rng: SolverRng,
    plan: SeatingPlan,
    score: Score,
    iteration: usize,
    improvements: usize,
}

impl Climber {
    pub fn new(config: ClimberConfig) -> Self {
        Climber {
            config,
            ..Default::default()
        }
    }
}

impl Solver for Climber {
    fn name(&self) -> String {
        "hill_climbing".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        self.plan = problem.starting_plan(plan, &mut rng)?;
        self.rng = rng;
        self.problem_id = problem.id.clone();
        self.score = self.plan.score();
        self.iteration = 0;
        self.improvements = 0;
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        if self.iteration >= self.config.max_iterations {
            return Ok(true);
        }
        self.iteration += 1;

        let candidate = Perturbation::Swap.apply(&self.plan, &mut self.rng);
        let score = candidate.score();
        if score > self.score {
            self.plan = candidate;
            self.score = score;
            self.improvements += 1;
        }

        let done = self.iteration >= self.config.max_iterations;
        if done {
            debug!(
                "hill_climbing({}): {} improvements in {} iterations, score {}",
                self.problem_id, self.improvements, self.iteration, self.score.0
            );
        }
        Ok(done)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        Some((&self.plan, self.score))
    }
}
