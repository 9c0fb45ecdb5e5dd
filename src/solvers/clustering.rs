use std::{
    cmp::Reverse,
    time::{Duration, Instant},
};

use derivative::Derivative;
use log::debug;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CapacityError, ConfigurationError, SeatingError},
    model::{GuestId, Roster},
    plan::SeatingPlan,
    scorer::{self, Affinity},
};

use super::{Problem, Score, Solver, SolverRng};

/// Where the first centroids come from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentroidInit {
    /// `num_tables` distinct guests drawn at random.
    #[default]
    Random,
    /// The most central guest of each table of the starting plan.
    Table,
}

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct ClusteringConfig {
    #[derivative(Default(value = "100"))]
    pub max_iterations: usize,
    pub init: CentroidInit,
    #[derivative(Default(value = "Affinity::Mutual"))]
    pub affinity: Affinity,
}

/// Centroid clustering: every table gathers around one guest, guests join the centroid they
/// like best, and each table's most central guest becomes its next centroid.
#[derive(Derivative, Clone)]
#[derivative(Default)]
pub struct KClustering {
    config: ClusteringConfig,
    problem: Problem,
    #[derivative(Default(value = "SolverRng::seed_from_u64(0)"))]
    rng: SolverRng,

    centroids: Vec<GuestId>,
    best: Option<(SeatingPlan, Score)>,
    iteration: usize,
    converged: bool,

    started: Option<Instant>,
    elapsed: Duration,
}

impl KClustering {
    pub fn new(config: ClusteringConfig) -> Self {
        KClustering {
            config,
            ..Default::default()
        }
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iteration
    }

    pub fn centroids(&self) -> &[GuestId] {
        &self.centroids
    }

    /// Seats every centroid at its own table, then everyone else around them.
    fn assign(&self) -> Result<SeatingPlan, SeatingError> {
        let roster = &self.problem.roster;
        let mode = self.config.affinity;
        let mut plan = SeatingPlan::empty(
            roster.clone(),
            self.problem.num_tables,
            self.problem.table_capacity,
        );
        let mut seated = vec![false; roster.len()];
        for (idx, centroid) in self.centroids.iter().enumerate() {
            if !seated[*centroid] && plan.seat(idx, *centroid) {
                seated[*centroid] = true;
            }
        }

        let pull = |guest: GuestId, idx: usize| mode.between(roster, guest, self.centroids[idx]);

        let mut deferred = vec![];
        for guest in roster.ids().filter(|g| !seated[*g]) {
            let top = (0..self.centroids.len()).max_by_key(|idx| (pull(guest, *idx), Reverse(*idx)));
            match top {
                Some(idx) if !plan.table(idx).is_full() => {
                    plan.seat(idx, guest);
                }
                _ => deferred.push(guest),
            }
        }

        for guest in deferred {
            let target = (0..self.centroids.len())
                .filter(|idx| !plan.table(*idx).is_full())
                .max_by_key(|idx| (pull(guest, *idx), Reverse(*idx)));
            match target {
                Some(idx) => {
                    plan.seat(idx, guest);
                }
                None => {
                    return Err(CapacityError {
                        guest: roster.name(guest).to_owned(),
                        seated: plan.seated(),
                        total: roster.len(),
                    }
                    .into())
                }
            }
        }
        Ok(plan)
    }
}

/// Guest of each table with the highest in-table affinity, lowest id on ties; empty tables
/// get a random guest.
fn centres<R: Rng + ?Sized>(
    roster: &Roster,
    plan: &SeatingPlan,
    mode: Affinity,
    rng: &mut R,
) -> Vec<GuestId> {
    plan.tables()
        .iter()
        .map(|table| {
            let centre = table
                .guests()
                .iter()
                .copied()
                .max_by_key(|g| (scorer::affinity(roster, *g, table.guests(), mode), Reverse(*g)));
            centre.unwrap_or_else(|| rng.gen_range(0..roster.len()))
        })
        .collect()
}

impl Solver for KClustering {
    fn name(&self) -> String {
        "k_clustering".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        let started = Instant::now();
        let guests = problem.roster.len();
        if problem.num_tables > guests {
            return Err(ConfigurationError::TooManyTables {
                tables: problem.num_tables,
                guests,
            }
            .into());
        }
        if self.config.max_iterations == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "max_iterations".to_owned(),
                reason: "must be positive".to_owned(),
            }
            .into());
        }
        self.problem = problem.clone();

        self.centroids = match self.config.init {
            CentroidInit::Random => {
                let ids: Vec<GuestId> = problem.roster.ids().collect();
                ids.choose_multiple(&mut rng, problem.num_tables)
                    .copied()
                    .collect()
            }
            CentroidInit::Table => {
                let start = problem.starting_plan(plan, &mut rng)?;
                centres(&problem.roster, &start, self.config.affinity, &mut rng)
            }
        };
        self.rng = rng;
        self.best = None;
        self.iteration = 0;
        self.converged = false;
        self.started = Some(started);
        self.elapsed = started.elapsed();
        debug!(
            "k_clustering({}): initial centroids {:?}",
            self.problem.id, self.centroids
        );
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        if self.converged || self.iteration >= self.config.max_iterations {
            return Ok(true);
        }
        self.iteration += 1;

        let plan = self.assign()?;
        let score = plan.score();
        let next = centres(
            &self.problem.roster,
            &plan,
            self.config.affinity,
            &mut self.rng,
        );
        if self.best.as_ref().map_or(true, |(_, best)| score > *best) {
            self.best = Some((plan, score));
        }

        self.converged = next == self.centroids;
        self.centroids = next;
        if let Some(started) = self.started {
            self.elapsed = started.elapsed();
        }

        let done = self.converged || self.iteration >= self.config.max_iterations;
        if done {
            debug!(
                "k_clustering({}): {} after {} iterations, score {}",
                self.problem.id,
                if self.converged { "converged" } else { "stopped" },
                self.iteration,
                self.best.as_ref().map_or(0, |(_, s)| s.0)
            );
        }
        Ok(done)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        self.best.as_ref().map(|(plan, score)| (plan, *score))
    }

    fn elapsed(&self) -> Option<Duration> {
        Some(self.elapsed)
    }
}
