mod annealer;
mod brute_force;
mod chain;
mod climber;
mod clustering;
mod genetic;
mod greedy;
mod tabu;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dyn_clone::DynClone;
use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::SolverConfig,
    dto::{ProblemDto, SolutionDto, SolutionMetaDto},
    error::{InvalidPlanError, SeatingError, UnknownStrategyError},
    model::Roster,
    plan::{check_layout, SeatingPlan},
};

pub use self::annealer::{Annealer, AnnealerConfig, OperatorStats, PhaseWeights, TraceSample};
pub use self::brute_force::{BruteForce, BruteForceConfig};
pub use self::chain::Chain;
pub use self::climber::{Climber, ClimberConfig};
pub use self::clustering::{CentroidInit, ClusteringConfig, KClustering};
pub use self::genetic::{Genetic, GeneticConfig};
pub use self::greedy::{Greedy, GreedyConfig, GreedyKey};
pub use self::tabu::{Tabu, TabuConfig};

/// Random source handed to every solver; seeding it makes a run reproducible.
pub type SolverRng = ChaCha8Rng;

#[derive(Default, Clone, Debug)]
pub struct Problem {
    pub id: String,
    pub roster: Arc<Roster>,
    pub num_tables: usize,
    pub table_capacity: usize,
}

impl Problem {
    pub fn new(
        id: impl Into<String>,
        roster: Arc<Roster>,
        num_tables: usize,
        table_capacity: usize,
    ) -> Result<Self, SeatingError> {
        check_layout(roster.len(), num_tables, table_capacity)?;
        Ok(Problem {
            id: id.into(),
            roster,
            num_tables,
            table_capacity,
        })
    }

    /// Builds the roster from the declared guests first, then the preference rows.
    pub fn from_dto(id: impl Into<String>, data: &ProblemDto) -> Result<Self, SeatingError> {
        let mut roster = Roster::new();
        for name in &data.guests {
            roster.add_guest(name);
        }
        for row in &data.preferences {
            roster.set_preference(&row.guest, &row.other, row.score);
        }
        let num_tables = data.num_tables.unwrap_or_else(|| {
            if data.table_capacity == 0 {
                0
            } else {
                let guests = roster.len();
                guests / data.table_capacity + usize::from(guests % data.table_capacity != 0)
            }
        });
        Problem::new(id, Arc::new(roster), num_tables, data.table_capacity)
    }

    pub fn load(problem_path: &Path) -> std::io::Result<Self> {
        let id = problem_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "problem".to_owned());
        let file = File::open(problem_path)?;
        let reader = BufReader::new(file);
        let data: ProblemDto = serde_json::from_reader(reader)?;

        let problem = Problem::from_dto(id, &data)?;
        debug!(
            "problem({}): {} guests, {} tables of {}",
            problem.id,
            problem.roster.len(),
            problem.num_tables,
            problem.table_capacity
        );
        Ok(problem)
    }

    pub fn random_plan<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SeatingPlan, SeatingError> {
        SeatingPlan::random(self.roster.clone(), self.num_tables, self.table_capacity, rng)
    }

    /// Checks that `plan` seats this problem's roster in this problem's layout.
    pub fn check_plan(&self, plan: &SeatingPlan) -> Result<(), InvalidPlanError> {
        if plan.num_tables() != self.num_tables || plan.capacity() != self.table_capacity {
            return Err(InvalidPlanError::LayoutMismatch {
                tables: plan.num_tables(),
                capacity: plan.capacity(),
                expected_tables: self.num_tables,
                expected_capacity: self.table_capacity,
            });
        }
        if !Arc::ptr_eq(plan.roster(), &self.roster) {
            return Err(InvalidPlanError::ForeignRoster);
        }
        Ok(())
    }

    /// The plan a search starts from: the caller's seed once it fits, or a random one.
    pub fn starting_plan<R: Rng + ?Sized>(
        &self,
        plan: Option<SeatingPlan>,
        rng: &mut R,
    ) -> Result<SeatingPlan, SeatingError> {
        match plan {
            Some(plan) => {
                self.check_plan(&plan)?;
                Ok(plan)
            }
            None => self.random_plan(rng),
        }
    }
}

#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Score(pub i64);

impl Score {
    pub const MIN: Score = Score(i64::MIN);
}

#[derive(Clone, Debug)]
pub struct Solution {
    pub score: Score,
    pub plan: SeatingPlan,
    pub elapsed: Duration,
    /// Best score after every solver step.
    pub history: Vec<Score>,
}

impl Solution {
    pub fn load(dir: &Path, problem: &Problem) -> std::io::Result<(SeatingPlan, SolutionMetaDto)> {
        let problem_base = dir.join(&problem.id);

        // load the plan itself
        let data = SolutionDto::load(
            &problem_base.with_file_name(format!("{}_solution.json", problem.id)),
        )?;
        let plan = SeatingPlan::from_dto(problem.roster.clone(), problem.table_capacity, &data)?;

        // load solution metadata
        let metadata: SolutionMetaDto = {
            let path = problem_base.with_file_name(format!("{}_meta.json", problem.id));
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)?
        };

        Ok((plan, metadata))
    }

    pub fn save(&self, solver_name: String, problem: &Problem, dir: &Path) -> std::io::Result<()> {
        let problem_base = dir.join(&problem.id);

        let solution_meta = SolutionMetaDto {
            solver_name,
            score: self.score.0,
            elapsed_ms: self.elapsed.as_millis() as u64,
        };

        // write metadata
        {
            let path = problem_base.with_file_name(format!("{}_meta.json", problem.id));
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer(writer, &solution_meta)?;
        }

        // write the plan
        {
            let path = problem_base.with_file_name(format!("{}_solution.json", problem.id));
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer(writer, &self.plan.to_dto())?;
        }

        Ok(())
    }
}

/// A search strategy driven one step at a time.
///
/// Plan-seeded strategies start from the plan passed to `initialize` (or a random one when it
/// is `None`); construction strategies build their own plans and ignore it.
pub trait Solver: DynClone + Sync + Send {
    fn name(&self) -> String;

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        rng: SolverRng,
    ) -> Result<(), SeatingError>;

    /// Advances the search. Returns `true` once the solver is done.
    fn solve_step(&mut self) -> Result<bool, SeatingError>;

    /// Best complete plan found so far.
    fn best(&self) -> Option<(&SeatingPlan, Score)>;

    /// Wall time measured by the solver itself, if it keeps one.
    fn elapsed(&self) -> Option<Duration> {
        None
    }

    fn solve(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        rng: SolverRng,
    ) -> Result<Solution, SeatingError> {
        let start = Instant::now();
        self.initialize(problem, plan, rng)?;
        let mut history = vec![];
        loop {
            let done = self.solve_step()?;
            if let Some((_, score)) = self.best() {
                history.push(score);
            }
            if done {
                break;
            }
        }
        let (plan, score) = self
            .best()
            .map(|(plan, score)| (plan.clone(), score))
            .ok_or_else(|| SeatingError::Unsolved(self.name()))?;
        Ok(Solution {
            score,
            plan,
            elapsed: self.elapsed().unwrap_or_else(|| start.elapsed()),
            history,
        })
    }
}

dyn_clone::clone_trait_object!(Solver);

/// Every strategy the runner knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BruteForce,
    Greedy,
    HillClimbing,
    SimulatedAnnealing,
    TabuSearch,
    Genetic,
    KClustering,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::BruteForce,
        StrategyKind::Greedy,
        StrategyKind::HillClimbing,
        StrategyKind::SimulatedAnnealing,
        StrategyKind::TabuSearch,
        StrategyKind::Genetic,
        StrategyKind::KClustering,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::BruteForce => "brute_force",
            StrategyKind::Greedy => "greedy",
            StrategyKind::HillClimbing => "hill_climbing",
            StrategyKind::SimulatedAnnealing => "annealing",
            StrategyKind::TabuSearch => "tabu",
            StrategyKind::Genetic => "genetic",
            StrategyKind::KClustering => "k_clustering",
        }
    }

    pub fn build(self, config: &SolverConfig) -> Box<dyn Solver> {
        match self {
            StrategyKind::BruteForce => Box::new(BruteForce::new(config.brute_force.clone())),
            StrategyKind::Greedy => Box::new(Greedy::new(config.greedy.clone())),
            StrategyKind::HillClimbing => Box::new(Climber::new(config.hill_climbing.clone())),
            StrategyKind::SimulatedAnnealing => Box::new(Annealer::new(config.annealing.clone())),
            StrategyKind::TabuSearch => Box::new(Tabu::new(config.tabu.clone())),
            StrategyKind::Genetic => Box::new(Genetic::new(config.genetic.clone())),
            StrategyKind::KClustering => Box::new(KClustering::new(config.k_clustering.clone())),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brute_force" | "bruteforce" => Ok(StrategyKind::BruteForce),
            "greedy" => Ok(StrategyKind::Greedy),
            "hill_climbing" | "climber" => Ok(StrategyKind::HillClimbing),
            "annealing" | "annealer" => Ok(StrategyKind::SimulatedAnnealing),
            "tabu" => Ok(StrategyKind::TabuSearch),
            "genetic" => Ok(StrategyKind::Genetic),
            "k_clustering" | "clustering" => Ok(StrategyKind::KClustering),
            n => Err(UnknownStrategyError { name: n.to_owned() }),
        }
    }
}

pub const SOLVERS: &[&str] = &[
    "brute_force",
    "greedy",
    "hill_climbing",
    "annealing",
    "tabu",
    "genetic",
    "k_clustering",
];

/// Builds a solver from its name; `a+b` chains solvers, each seeded with the previous result.
pub fn create_solver(
    solver_name: &str,
    config: &SolverConfig,
) -> Result<Box<dyn Solver>, SeatingError> {
    if solver_name.contains('+') {
        let mut solvers = solver_name
            .split('+')
            .map(|name| create_individual_solver(name, config))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let first = solvers.next().ok_or_else(|| UnknownStrategyError {
            name: solver_name.to_owned(),
        })?;
        Ok(solvers.fold(first, |chain, next| Box::new(Chain::new(chain, next))))
    } else {
        create_individual_solver(solver_name, config)
    }
}

fn create_individual_solver(
    solver_name: &str,
    config: &SolverConfig,
) -> Result<Box<dyn Solver>, SeatingError> {
    let kind: StrategyKind = solver_name.trim().parse()?;
    Ok(kind.build(config))
}
