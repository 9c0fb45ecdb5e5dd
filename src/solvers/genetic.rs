use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use derivative::Derivative;
use log::debug;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CapacityError, ConfigurationError, SeatingError},
    model::{GuestId, Roster},
    operators,
    plan::{PlanKey, SeatingPlan},
    scorer::{self, Affinity},
};

use super::{Problem, Score, Solver, SolverRng};

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct GeneticConfig {
    #[derivative(Default(value = "50"))]
    pub population_size: usize,
    #[derivative(Default(value = "100"))]
    pub generations: usize,
    #[derivative(Default(value = "0.1"))]
    pub mutation_rate: f64,
    /// Share of the population carried over unchanged; at least one individual survives.
    #[derivative(Default(value = "0.1"))]
    pub elitism_rate: f64,
    #[derivative(Default(value = "3"))]
    pub tournament_size: usize,
}

impl GeneticConfig {
    fn check(&self) -> Result<(), ConfigurationError> {
        let invalid = |name: &str, reason: &str| ConfigurationError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        if self.population_size == 0 {
            return Err(invalid("population_size", "must be positive"));
        }
        if self.tournament_size == 0 {
            return Err(invalid("tournament_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(invalid("mutation_rate", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.elitism_rate) {
            return Err(invalid("elitism_rate", "must be in [0, 1]"));
        }
        Ok(())
    }

    fn elite_count(&self) -> usize {
        ((self.elitism_rate * self.population_size as f64).round() as usize)
            .clamp(1, self.population_size)
    }
}

#[derive(Derivative, Clone)]
#[derivative(Default)]
pub struct Genetic {
    config: GeneticConfig,
    problem: Problem,
    #[derivative(Default(value = "SolverRng::seed_from_u64(0)"))]
    rng: SolverRng,

    population: Vec<SeatingPlan>,
    fitness: Vec<Score>,
    memo: HashMap<PlanKey, Score>,

    best: SeatingPlan,
    best_score: Score,
    generation: usize,
}

impl Genetic {
    pub fn new(config: GeneticConfig) -> Self {
        Genetic {
            config,
            ..Default::default()
        }
    }

    /// Distinct plans scored so far.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Scores the population, computing only plans that were never seen before.
    fn evaluate(&mut self, population: &[SeatingPlan]) -> Vec<Score> {
        let keys: Vec<PlanKey> = population.par_iter().map(SeatingPlan::key).collect();
        let fresh: Vec<(PlanKey, Score)> = keys
            .iter()
            .zip(population)
            .filter(|(key, _)| !self.memo.contains_key(*key))
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(key, plan)| (key.clone(), plan.score()))
            .collect();
        self.memo.extend(fresh);
        keys.iter().map(|key| self.memo[key]).collect()
    }

    fn tournament(&mut self) -> usize {
        let n = self.population.len();
        let mut winner = self.rng.gen_range(0..n);
        for _ in 1..self.config.tournament_size {
            let challenger = self.rng.gen_range(0..n);
            if self.fitness[challenger] > self.fitness[winner] {
                winner = challenger;
            }
        }
        winner
    }

    fn crossover(&mut self, a: usize, b: usize) -> Result<SeatingPlan, SeatingError> {
        let tables: Vec<Vec<GuestId>> = (0..self.problem.num_tables)
            .map(|idx| {
                let parent = if self.rng.gen_bool(0.5) { a } else { b };
                self.population[parent].table(idx).guests().to_vec()
            })
            .collect();
        repair(
            &self.problem.roster,
            self.problem.table_capacity,
            tables,
            &mut self.rng,
        )
    }

    fn track_best(&mut self) {
        let champion = (0..self.population.len()).max_by_key(|i| (self.fitness[*i], Reverse(*i)));
        if let Some(idx) = champion {
            if self.fitness[idx] > self.best_score {
                self.best = self.population[idx].clone();
                self.best_score = self.fitness[idx];
            }
        }
    }
}

/// Turns the raw output of a per-table crossover back into a partition.
///
/// The first occurrence of every guest (scanning tables in order) is kept and later copies
/// are dropped. Guests that ended up nowhere are then seated in random order at the table
/// with room they have the highest mutual affinity for.
pub fn repair<R: Rng + ?Sized>(
    roster: &Arc<Roster>,
    capacity: usize,
    tables: Vec<Vec<GuestId>>,
    rng: &mut R,
) -> Result<SeatingPlan, SeatingError> {
    let mut plan = SeatingPlan::empty(roster.clone(), tables.len(), capacity);
    let mut seated = vec![false; roster.len()];
    for (idx, guests) in tables.into_iter().enumerate() {
        for guest in guests {
            if guest < seated.len() && !seated[guest] && plan.seat(idx, guest) {
                seated[guest] = true;
            }
        }
    }

    let mut missing: Vec<GuestId> = roster.ids().filter(|g| !seated[*g]).collect();
    missing.shuffle(rng);
    for guest in missing {
        let target = (0..plan.num_tables())
            .filter(|idx| !plan.table(*idx).is_full())
            .max_by_key(|idx| {
                (
                    scorer::affinity(roster, guest, plan.table(*idx).guests(), Affinity::Mutual),
                    Reverse(*idx),
                )
            });
        let Some(target) = target else {
            return Err(CapacityError {
                guest: roster.name(guest).to_owned(),
                seated: plan.seated(),
                total: roster.len(),
            }
            .into());
        };
        plan.seat(target, guest);
    }
    Ok(plan)
}

impl Solver for Genetic {
    fn name(&self) -> String {
        "genetic".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        self.config.check()?;
        if let Some(plan) = &plan {
            problem.check_plan(plan)?;
        }
        self.problem = problem.clone();

        let mut population = (0..self.config.population_size)
            .map(|_| problem.random_plan(&mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(plan) = plan {
            population[0] = plan;
        }
        self.rng = rng;

        self.memo.clear();
        self.fitness = self.evaluate(&population);
        self.population = population;
        self.best_score = Score::MIN;
        self.track_best();
        self.generation = 0;
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        if self.generation >= self.config.generations {
            return Ok(true);
        }

        let n = self.population.len();
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by_key(|i| Reverse(self.fitness[*i]));

        let mut next: Vec<SeatingPlan> = ranked[..self.config.elite_count()]
            .iter()
            .map(|i| self.population[*i].clone())
            .collect();
        while next.len() < n {
            let a = self.tournament();
            let b = self.tournament();
            let mut child = self.crossover(a, b)?;
            if self.rng.gen_bool(self.config.mutation_rate) {
                operators::swap(&mut child, &mut self.rng);
            }
            next.push(child);
        }

        self.fitness = self.evaluate(&next);
        self.population = next;
        self.track_best();
        self.generation += 1;

        debug!(
            "genetic({}): generation {} of {}, best {}, {} distinct plans scored",
            self.problem.id,
            self.generation,
            self.config.generations,
            self.best_score.0,
            self.memo.len()
        );
        Ok(self.generation >= self.config.generations)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        if self.population.is_empty() {
            None
        } else {
            Some((&self.best, self.best_score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{four_guests, random_plan, rng, wedding_problem};

    fn small() -> GeneticConfig {
        GeneticConfig {
            population_size: 20,
            generations: 30,
            ..Default::default()
        }
    }

    #[test]
    fn repair_restores_the_partition() {
        let roster = Arc::new(four_guests());
        // Alice twice, Charlie nowhere.
        let plan = repair(&roster, 2, vec![vec![0, 1], vec![0, 3]], &mut rng(0)).unwrap();
        plan.validate().unwrap();
        assert_eq!(plan.table(0).guests(), &[0, 1]);
        assert_eq!(plan.table(1).guests(), &[3, 2]);
    }

    #[test]
    fn repair_seats_missing_guests_by_affinity() {
        let roster = Arc::new(four_guests());
        // Bob is missing; he likes Alice's table far more than David's.
        let plan = repair(&roster, 3, vec![vec![0], vec![3, 2, 2]], &mut rng(0)).unwrap();
        plan.validate().unwrap();
        assert_eq!(plan.table(0).guests(), &[0, 1]);
        assert_eq!(plan.table(1).guests(), &[3, 2]);
    }

    #[test]
    fn best_is_monotonic_and_valid() {
        let problem = wedding_problem();
        let solution = Genetic::new(small()).solve(&problem, None, rng(12)).unwrap();
        solution.plan.validate().unwrap();
        assert_eq!(solution.score, solution.plan.score());
        assert!(solution.history.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(solution.history.len(), 30);
    }

    #[test]
    fn seed_plan_sets_the_floor() {
        let problem = wedding_problem();
        let seed = random_plan(&problem, 77);
        let seed_score = seed.score();
        let mut solver = Genetic::new(small());
        solver.initialize(&problem, Some(seed), rng(1)).unwrap();
        assert!(solver.best().unwrap().1 >= seed_score);
        while !solver.solve_step().unwrap() {}
        assert!(solver.best().unwrap().1 >= seed_score);
        assert!(solver.memo_len() > 0);
    }

    #[test]
    fn same_seed_same_result() {
        let problem = wedding_problem();
        let a = Genetic::new(small()).solve(&problem, None, rng(5)).unwrap();
        let b = Genetic::new(small()).solve(&problem, None, rng(5)).unwrap();
        assert_eq!(a.plan.key(), b.plan.key());
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn empty_population_is_rejected() {
        let problem = wedding_problem();
        let mut solver = Genetic::new(GeneticConfig {
            population_size: 0,
            ..Default::default()
        });
        assert!(matches!(
            solver.solve(&problem, None, rng(0)),
            Err(SeatingError::Configuration(ConfigurationError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn elitism_keeps_at_least_one() {
        let config = GeneticConfig {
            population_size: 4,
            elitism_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(config.elite_count(), 1);
        assert_eq!(GeneticConfig::default().elite_count(), 5);
    }
}
