use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::solvers::{
    AnnealerConfig, BruteForceConfig, ClimberConfig, ClusteringConfig, GeneticConfig,
    GreedyConfig, TabuConfig,
};

/// Tunables for every strategy. Any field left out of a config file keeps its default.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SolverConfig {
    pub brute_force: BruteForceConfig,
    pub greedy: GreedyConfig,
    pub hill_climbing: ClimberConfig,
    pub annealing: AnnealerConfig,
    pub tabu: TabuConfig,
    pub genetic: GeneticConfig,
    pub k_clustering: ClusteringConfig,
}

impl SolverConfig {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
