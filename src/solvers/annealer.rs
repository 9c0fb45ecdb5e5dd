use derivative::Derivative;
use log::debug;
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigurationError, SeatingError},
    operators::Perturbation,
    plan::SeatingPlan,
};

use super::{Problem, Score, Solver, SolverRng};

/// Operator weights per run phase, indexed like [`Perturbation::ALL`].
///
/// The first 30% of the run draws from `explore`, the middle 40% from `balanced` and the
/// rest from `exploit`.
#[derive(Derivative, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[derivative(Default)]
#[serde(default)]
pub struct PhaseWeights {
    #[derivative(Default(value = "[0.35, 0.35, 0.1, 0.1, 0.1]"))]
    pub explore: [f64; 5],
    #[derivative(Default(value = "[0.25, 0.25, 0.2, 0.15, 0.15]"))]
    pub balanced: [f64; 5],
    #[derivative(Default(value = "[0.3, 0.3, 0.1, 0.05, 0.25]"))]
    pub exploit: [f64; 5],
}

impl PhaseWeights {
    pub fn phase(progress: f64) -> usize {
        if progress < 0.3 {
            0
        } else if progress < 0.7 {
            1
        } else {
            2
        }
    }

    fn samplers(&self) -> Result<Vec<WeightedIndex<f64>>, ConfigurationError> {
        [
            ("explore", &self.explore),
            ("balanced", &self.balanced),
            ("exploit", &self.exploit),
        ]
        .into_iter()
        .map(|(name, weights)| {
            WeightedIndex::new(weights.iter().copied()).map_err(|e| {
                ConfigurationError::InvalidParameter {
                    name: format!("phase_weights.{name}"),
                    reason: e.to_string(),
                }
            })
        })
        .collect()
    }
}

#[derive(Derivative, Serialize, Deserialize, Debug, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct AnnealerConfig {
    #[derivative(Default(value = "1000.0"))]
    pub initial_temperature: f64,
    #[derivative(Default(value = "0.05"))]
    pub cooling_rate: f64,
    #[derivative(Default(value = "10_000"))]
    pub iterations: usize,
    #[derivative(Default(value = "1e-9"))]
    pub min_temperature: f64,
    /// Non-improving iterations tolerated before the plateau response.
    #[derivative(Default(value = "1000"))]
    pub plateau_threshold: usize,
    #[derivative(Default(value = "0.7"))]
    pub plateau_cool_probability: f64,
    #[derivative(Default(value = "0.8"))]
    pub cooldown_factor: f64,
    #[derivative(Default(value = "1.5"))]
    pub reheat_factor: f64,
    /// Record a trace sample every this many iterations; 0 disables the trace.
    #[derivative(Default(value = "100"))]
    pub trace_interval: usize,
    pub phase_weights: PhaseWeights,
}

impl AnnealerConfig {
    fn check(&self) -> Result<(), ConfigurationError> {
        let invalid = |name: &str, reason: &str| ConfigurationError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        if !(self.initial_temperature > 0.0) {
            return Err(invalid("initial_temperature", "must be positive"));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(invalid("cooling_rate", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.plateau_cool_probability) {
            return Err(invalid("plateau_cool_probability", "must be in [0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperatorStats {
    pub attempts: usize,
    pub accepted: usize,
    /// Accepted moves that strictly raised the current score.
    pub improved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceSample {
    pub iteration: usize,
    pub current: Score,
    pub best: Score,
    pub temperature: f64,
}

/// Simulated annealing over all five perturbation operators.
///
/// The schedule is `T0 * adjust * rate^(1 + 2 * progress)`. Plateau responses scale `adjust`,
/// so a reheat or an extra cooldown persists through later schedule updates.
#[derive(Derivative, Clone)]
#[derivative(Default)]
pub struct Annealer {
    config: AnnealerConfig,
    problem_id: String,
    #[derivative(Default(value = "SolverRng::seed_from_u64(0)"))]
    rng: SolverRng,
    samplers: Vec<WeightedIndex<f64>>,

    current: SeatingPlan,
    current_score: Score,
    best: SeatingPlan,
    best_score: Score,

    temperature: f64,
    adjust: f64,
    stale: usize,
    iteration: usize,
    plateaus: usize,

    stats: [OperatorStats; 5],
    trace: Vec<TraceSample>,
}

impl Annealer {
    pub fn new(config: AnnealerConfig) -> Self {
        Annealer {
            config,
            ..Default::default()
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn stats(&self) -> impl Iterator<Item = (Perturbation, OperatorStats)> + '_ {
        Perturbation::ALL.into_iter().zip(self.stats.iter().copied())
    }

    pub fn trace(&self) -> &[TraceSample] {
        &self.trace
    }

    /// How many times the plateau response fired.
    pub fn plateaus(&self) -> usize {
        self.plateaus
    }

    fn scheduled_temperature(&self, progress: f64) -> f64 {
        let t = self.config.initial_temperature
            * self.adjust
            * self.config.cooling_rate.powf(1.0 + 2.0 * progress);
        t.max(self.config.min_temperature)
    }

    fn respond_to_plateau(&mut self) {
        let factor = if self.rng.gen_bool(self.config.plateau_cool_probability) {
            self.config.cooldown_factor
        } else {
            self.config.reheat_factor
        };
        self.adjust *= factor;
        self.temperature = (self.temperature * factor).max(self.config.min_temperature);
        self.stale = 0;
        self.plateaus += 1;
    }

    fn accepts(&mut self, delta: i64) -> bool {
        if delta > 0 {
            return true;
        }
        let p = (delta as f64 / self.temperature).exp();
        self.rng.gen::<f64>() < p
    }

    fn log_summary(&self) {
        debug!(
            "annealing({}): best {} after {} iterations, {} plateau responses, final temperature {:.3e}",
            self.problem_id, self.best_score.0, self.iteration, self.plateaus, self.temperature
        );
        for (op, stats) in self.stats() {
            debug!(
                "annealing({}): {:>16} attempts {:>6} accepted {:>6} improved {:>6}",
                self.problem_id,
                op.name(),
                stats.attempts,
                stats.accepted,
                stats.improved
            );
        }
        for sample in &self.trace {
            debug!(
                "annealing({}): #{} current {} best {} T {:.3e}",
                self.problem_id,
                sample.iteration,
                sample.current.0,
                sample.best.0,
                sample.temperature
            );
        }
    }
}

impl Solver for Annealer {
    fn name(&self) -> String {
        "annealing".to_owned()
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        plan: Option<SeatingPlan>,
        mut rng: SolverRng,
    ) -> Result<(), SeatingError> {
        self.config.check()?;
        self.samplers = self.config.phase_weights.samplers()?;

        self.current = problem.starting_plan(plan, &mut rng)?;
        self.rng = rng;
        self.problem_id = problem.id.clone();
        self.current_score = self.current.score();
        self.best = self.current.clone();
        self.best_score = self.current_score;

        self.temperature = self.config.initial_temperature;
        self.adjust = 1.0;
        self.stale = 0;
        self.iteration = 0;
        self.plateaus = 0;
        self.stats = Default::default();
        self.trace = vec![];
        Ok(())
    }

    fn solve_step(&mut self) -> Result<bool, SeatingError> {
        let total = self.config.iterations;
        if self.iteration >= total {
            return Ok(true);
        }
        let progress = self.iteration as f64 / total as f64;

        if self.stale > self.config.plateau_threshold {
            self.respond_to_plateau();
        }

        let op_idx = self.samplers[PhaseWeights::phase(progress)].sample(&mut self.rng);
        let op = Perturbation::ALL[op_idx];
        let candidate = op.apply(&self.current, &mut self.rng);
        let score = candidate.score();
        let delta = score.0 - self.current_score.0;

        self.stats[op_idx].attempts += 1;
        if self.accepts(delta) {
            self.stats[op_idx].accepted += 1;
            if delta > 0 {
                self.stats[op_idx].improved += 1;
                self.stale = 0;
            } else {
                self.stale += 1;
            }
            self.current = candidate;
            self.current_score = score;
            if score > self.best_score {
                self.best = self.current.clone();
                self.best_score = score;
            }
        } else {
            self.stale += 1;
        }

        self.iteration += 1;
        self.temperature = self.scheduled_temperature(progress);

        if self.config.trace_interval > 0 && self.iteration % self.config.trace_interval == 0 {
            self.trace.push(TraceSample {
                iteration: self.iteration,
                current: self.current_score,
                best: self.best_score,
                temperature: self.temperature,
            });
        }

        let done = self.iteration >= total;
        if done {
            self.log_summary();
        }
        Ok(done)
    }

    fn best(&self) -> Option<(&SeatingPlan, Score)> {
        Some((&self.best, self.best_score))
    }
}
