use derivative::Derivative;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigurationError, SeatingError},
    model::{GuestId, Roster, Table},
    plan::SeatingPlan,
    scorer::{self, Affinity},
};

use super::{Problem, Score, Solver, SolverRng};

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct BruteForceConfig {
    /// Larger rosters are refused outright.
    #[derivative(Default(value = "12"))]
    pub max_guests: usize,
    /// Stop after this many complete partitions; `None` enumerates everything.
    #[derivative(Default(value = "Some(1_000_000)"))]
    pub max_partitions: Option<usize>,
}

/// Exhaustive search over set partitions.
///
/// Tables are interchangeable, so guest `i` may only join a table that is already in use or
/// the first unused one. That visits every partition of the roster into at most
/// `num_tables` capacity-bounded groups exactly once, instead of every ordering of the
/// roster.
#[derive(Default, Clone)]
pub struct BruteForce {
    config: BruteForceConfig,
    problem: Problem,
    best: Option<SeatingPlan>,
    best_score: Score,
    visited: usize,
    exhausted: bool,
}

impl BruteForce {
    pub fn new(config: BruteForceConfig) -> Self {
        BruteForce {
            config,
            ..Default::default()
        }
    }

    /// Number of complete partitions scored by the last run.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Whether the last run covered the whole search space.
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }
}

struct Enumeration<'a> {
    roster: &'a Roster,
    tables: Vec<Table>,
    limit: Option<usize>,
    visited: usize,
    best_score: i64,
    best_tables: Option<Vec<Vec<GuestId>>>,
}

impl Enumeration<'_> {
    /// Returns `false` once the partition limit is hit.
    fn descend(&mut self, guest: GuestId, opened: usize, score: i64) -> bool {
        if guest == self.roster.len() {
            self.visited += 1;
            if self.best_tables.is_none() || score > self.best_score {
                self.best_score = score;
                self.best_tables = Some(self.tables.iter().map(|t| t.guests().to_vec()).collect());
            }
            return self.limit.map_or(true, |limit| self.visited < limit);
        }

        let reachable = (opened + 1).min(self.tables.len());
        for idx in 0..reachable {
            if self.tables[idx].is_full() {
                continue;
            }
            let delta = scorer::affinity(self.roster, guest, self.tables[idx].guests(), Affinity::Mutual);
            self.tables[idx].add_guest(guest);
            let keep_going = self.descend(guest + 1, opened.max(idx + 1), score + delta);
            self.tables[idx].remove_guest(guest);
            if !keep_going {
                return false;
            }
        }
        true
    }
}

impl Solver for BruteForce {
    fn name(&self) -> String {
        "brute_force".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        _rng: SolverRng,
    ) -> Result<(), SeatingError> {
        let guests = problem.roster.len();
        if problem.num_tables > guests {
            return Err(ConfigurationError::TooManyTables {
                tables: problem.num_tables,
                guests,
            }
            .into());
        }
        if guests > self.config.max_guests {
            return Err(ConfigurationError::TooManyGuests {
                guests,
                limit: self.config.max_guests,
            }
            .into());
        }
        if plan.is_some() {
            debug!("brute_force({}): ignoring the seed plan", problem.id);
        }
        self.problem = problem.clone();
        self.best = None;
        self.best_score = Score::MIN;
        self.visited = 0;
        self.exhausted = false;
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        let mut search = Enumeration {
            roster: &self.problem.roster,
            tables: (0..self.problem.num_tables)
                .map(|_| Table::new(self.problem.table_capacity))
                .collect(),
            limit: self.config.max_partitions,
            visited: 0,
            best_score: i64::MIN,
            best_tables: None,
        };
        self.exhausted = search.descend(0, 0, 0);
        self.visited = search.visited;
        let best_tables = search.best_tables.take();

        if !self.exhausted {
            warn!(
                "brute_force({}): stopped after {} partitions, result may not be optimal",
                self.problem.id, self.visited
            );
        }
        debug!(
            "brute_force({}): {} partitions scored, best {}",
            self.problem.id, self.visited, search.best_score
        );

        let tables = best_tables.ok_or_else(|| SeatingError::Unsolved(self.name()))?;
        let plan = SeatingPlan::from_tables(
            self.problem.roster.clone(),
            self.problem.table_capacity,
            tables,
        )?;
        self.best_score = plan.score();
        self.best = Some(plan);
        Ok(true)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        self.best.as_ref().map(|plan| (plan, self.best_score))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixtures::{four_guests, rng, wedding, wedding_problem};

    /// Best score over every assignment of guests to table indices.
    fn best_by_assignment(problem: &Problem) -> Score {
        let n = problem.roster.len();
        let k = problem.num_tables;
        let mut best = Score::MIN;
        for code in 0..k.pow(n as u32) {
            let mut tables = vec![vec![]; k];
            let mut rest = code;
            for guest in 0..n {
                tables[rest % k].push(guest);
                rest /= k;
            }
            if tables.iter().any(|t| t.len() > problem.table_capacity) {
                continue;
            }
            let plan = SeatingPlan::from_tables(
                problem.roster.clone(),
                problem.table_capacity,
                tables,
            )
            .unwrap();
            best = best.max(plan.score());
        }
        best
    }

    #[test]
    fn finds_the_couples_plan() {
        let problem = Problem::new("four", Arc::new(four_guests()), 2, 2).unwrap();
        let solution = BruteForce::default().solve(&problem, None, rng(0)).unwrap();
        assert_eq!(solution.score, Score(20));
        assert_eq!(solution.score, best_by_assignment(&problem));
        let alice = solution.plan.table_of(0);
        assert_eq!(alice, solution.plan.table_of(1));
        assert_eq!(solution.plan.table_of(2), solution.plan.table_of(3));
        assert_ne!(alice, solution.plan.table_of(2));
    }

    #[test]
    fn matches_full_enumeration_on_the_wedding() {
        let problem = wedding_problem();
        let mut solver = BruteForce::default();
        let solution = solver.solve(&problem, None, rng(0)).unwrap();
        assert!(solver.exhausted());
        solution.plan.validate().unwrap();
        assert_eq!(solution.score, best_by_assignment(&problem));
    }

    #[test]
    fn counts_each_partition_once() {
        // 4 guests into 2 tables of 2: {AB|CD}, {AC|BD}, {AD|BC}.
        let problem = Problem::new("four", Arc::new(four_guests()), 2, 2).unwrap();
        let mut solver = BruteForce::default();
        solver.solve(&problem, None, rng(0)).unwrap();
        assert_eq!(solver.visited(), 3);
    }

    #[test]
    fn rejects_more_tables_than_guests() {
        let problem = Problem::new("four", Arc::new(four_guests()), 5, 1).unwrap();
        let err = BruteForce::default().solve(&problem, None, rng(0)).unwrap_err();
        assert_eq!(
            err,
            SeatingError::Configuration(ConfigurationError::TooManyTables {
                tables: 5,
                guests: 4
            })
        );
    }

    #[test]
    fn rejects_large_rosters() {
        let problem = Problem::new("wedding", Arc::new(wedding()), 3, 3).unwrap();
        let mut solver = BruteForce::new(BruteForceConfig {
            max_guests: 6,
            ..Default::default()
        });
        assert!(matches!(
            solver.solve(&problem, None, rng(0)),
            Err(SeatingError::Configuration(ConfigurationError::TooManyGuests { .. }))
        ));
    }

    #[test]
    fn partition_limit_still_returns_a_valid_plan() {
        let problem = wedding_problem();
        let mut solver = BruteForce::new(BruteForceConfig {
            max_partitions: Some(1),
            ..Default::default()
        });
        let solution = solver.solve(&problem, None, rng(0)).unwrap();
        assert!(!solver.exhausted());
        assert_eq!(solver.visited(), 1);
        solution.plan.validate().unwrap();
    }
}
