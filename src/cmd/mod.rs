use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod default;
pub mod score;
pub mod stats;

#[derive(Parser, Debug)]
#[clap()]
pub struct Args {
    /// Run every problem under ./problems with every strategy.
    #[clap(long)]
    pub batch: bool,
    #[clap(short, long, value_parser)]
    pub problems: Vec<PathBuf>,
    /// Strategy names; `a+b` chains strategies.
    #[clap(short, long)]
    pub solvers: Vec<String>,
    /// Fixes every random choice of the run.
    #[clap(long)]
    pub seed: Option<u64>,
    /// Run the strategies of each problem in parallel.
    #[clap(long)]
    pub parallel: bool,
    /// JSON file with strategy tunables.
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,
    #[clap(short, long, value_parser, default_value = "./solutions/")]
    pub output: PathBuf,
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Stats,
    Score {
        problem: PathBuf,
        solution: PathBuf,
    },
}
