use log::debug;
use rand::{Rng, SeedableRng};

use crate::{error::SeatingError, plan::SeatingPlan};

use super::{Problem, Score, Solver, SolverRng};

/// Runs `solver0` to completion, then `solver1` starting from its best plan.
#[derive(Clone)]
pub struct Chain {
    solver0: Box<dyn Solver>,
    solver1: Box<dyn Solver>,
    step0: bool,
    problem: Problem,
    rng: SolverRng,
}

impl Solver for Chain {
    fn name(&self) -> String {
        format!("{}+{}", self.solver0.name(), self.solver1.name())
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        self.rng = SolverRng::seed_from_u64(rng.gen());
        self.solver0.initialize(problem, plan, rng)?;
        self.step0 = true;
        self.problem = problem.clone();
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        if !self.step0 {
            return self.solver1.solve_step();
        }
        if self.solver0.solve_step()? {
            debug!(
                "chain({}): switching to {}",
                self.problem.id,
                self.solver1.name()
            );
            let seed = self.solver0.best().map(|(plan, _)| plan.clone());
            self.solver1
                .initialize(&self.problem, seed, self.rng.clone())?;
            self.step0 = false;
        }
        Ok(false)
    }

    /// The better of both stages; the later stage wins ties.
    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        let first = self.solver0.best();
        if self.step0 {
            return first;
        }
        match (first, self.solver1.best()) {
            (Some(a), Some(b)) if a.1 > b.1 => Some(a),
            (a, None) => a,
            (_, b) => b,
        }
    }
}

impl Chain {
    pub fn new(solver0: Box<dyn Solver>, solver1: Box<dyn Solver>) -> Self {
        Chain {
            solver0,
            solver1,
            step0: true,
            problem: Problem::default(),
            rng: SolverRng::seed_from_u64(0),
        }
    }
}
