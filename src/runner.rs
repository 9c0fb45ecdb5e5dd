use std::time::{Duration, Instant};

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::{
    config::SolverConfig,
    dto::ReportRowDto,
    error::SeatingError,
    plan::SeatingPlan,
    solvers::{create_solver, Problem, Solution, SolverRng},
};

/// Outcome of one strategy on one problem. A failing strategy does not stop the others.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub strategy: String,
    pub outcome: Result<Solution, SeatingError>,
    /// Wall time around the whole run, including solver construction.
    pub wall: Duration,
}

impl RunReport {
    pub fn score(&self) -> Option<i64> {
        self.outcome.as_ref().ok().map(|s| s.score.0)
    }

    pub fn row(&self) -> ReportRowDto {
        match &self.outcome {
            Ok(solution) => ReportRowDto {
                algorithm: self.strategy.clone(),
                best_score: Some(solution.score.0),
                time_taken: solution.elapsed.as_secs_f64(),
                seating_plan: Some(solution.plan.to_dto()),
                error: None,
            },
            Err(e) => ReportRowDto {
                algorithm: self.strategy.clone(),
                best_score: None,
                time_taken: self.wall.as_secs_f64(),
                seating_plan: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Runs a list of strategies on the same problem, all starting from one shared random plan.
///
/// Every strategy gets its own rng seeded from a master seed, so a fixed seed reproduces the
/// whole comparison whether it runs sequentially or in parallel.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    strategies: Vec<String>,
    config: SolverConfig,
    seed: Option<u64>,
    parallel: bool,
}

impl Runner {
    pub fn new(strategies: Vec<String>, config: SolverConfig) -> Self {
        Runner {
            strategies,
            config,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    /// Fails only if the problem cannot be seated at all; per-strategy errors are reported
    /// in the returned rows, in request order.
    pub fn run(&self, problem: &Problem) -> Result<Vec<RunReport>, SeatingError> {
        let mut master = match self.seed {
            Some(seed) => SolverRng::seed_from_u64(seed),
            None => SolverRng::from_entropy(),
        };
        let initial = problem.random_plan(&mut master)?;
        let jobs: Vec<(&String, u64)> = self
            .strategies
            .iter()
            .map(|name| (name, master.gen()))
            .collect();

        let reports = if self.parallel {
            jobs.par_iter()
                .map(|(name, seed)| self.run_one(name, *seed, problem, &initial))
                .collect()
        } else {
            jobs.iter()
                .map(|(name, seed)| self.run_one(name, *seed, problem, &initial))
                .collect()
        };
        Ok(reports)
    }

    fn run_one(
        &self,
        name: &str,
        seed: u64,
        problem: &Problem,
        initial: &SeatingPlan,
    ) -> RunReport {
        let start = Instant::now();
        info!("solving problem {} using {}", problem.id, name);
        let outcome = create_solver(name, &self.config).and_then(|mut solver| {
            solver.solve(
                problem,
                Some(initial.clone()),
                SolverRng::seed_from_u64(seed),
            )
        });
        if let Err(e) = &outcome {
            warn!("{}({}): {}", name, problem.id, e);
        }
        RunReport {
            strategy: name.to_owned(),
            outcome,
            wall: start.elapsed(),
        }
    }
}
