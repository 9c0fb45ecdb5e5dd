use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

/// One directed preference row: `guest` feels `score` about sitting with `other`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PreferenceDto {
    pub guest: String,
    pub other: String,
    pub score: i64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ProblemDto {
    pub table_capacity: usize,
    /// Defaults to as many tables as the roster needs.
    #[serde(default)]
    pub num_tables: Option<usize>,
    /// Guests to seat even if they never appear in a preference row.
    #[serde(default)]
    pub guests: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<PreferenceDto>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SolutionDto {
    pub tables: Vec<Vec<String>>,
}

impl SolutionDto {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SolutionMetaDto {
    pub solver_name: String,
    pub score: i64,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// One row of the comparison report, one per strategy run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportRowDto {
    pub algorithm: String,
    pub best_score: Option<i64>,
    /// Seconds.
    pub time_taken: f64,
    pub seating_plan: Option<SolutionDto>,
    pub error: Option<String>,
}
