use std::path::{Path, PathBuf};

use clap::Parser;
use cmd::default::*;
use cmd::score::*;
use cmd::stats::*;
use cmd::Args;
use cmd::Commands;
use seatplan::{config::SolverConfig, solvers::SOLVERS};

mod cmd;

fn file_id(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
}

fn get_problem_paths(args: &Args, force_batch: bool) -> Result<Vec<PathBuf>, std::io::Error> {
    if !args.problems.is_empty() {
        Ok(args.problems.clone())
    } else if args.batch || force_batch {
        get_all_problem_paths()
    } else {
        Ok(vec![PathBuf::from("./problems/wedding.json")])
    }
}

fn get_all_problem_paths() -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir("./problems")?
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .map(|f| f.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn get_solvers(args: &Args) -> Vec<String> {
    if !args.solvers.is_empty() {
        args.solvers.clone()
    } else {
        SOLVERS.iter().map(|s| s.to_string()).collect()
    }
}

fn list_current_solvers(base_solution_dir: &Path) -> std::io::Result<Vec<String>> {
    let dir = base_solution_dir.join("current");
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut current_solvers = vec![];
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                current_solvers.push(name.to_owned());
            }
        }
    }
    current_solvers.sort();
    Ok(current_solvers)
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.command {
        Some(Commands::Stats) => {
            let problems: Vec<String> = get_problem_paths(&args, true)?
                .iter()
                .filter_map(|p| file_id(p))
                .collect();
            let solvers = if args.solvers.is_empty() {
                list_current_solvers(&args.output)?
            } else {
                args.solvers.clone()
            };
            stats(&args.output, &problems, &solvers)
        }
        Some(Commands::Score { problem, solution }) => score(problem, solution),
        None => {
            let config = match &args.config {
                Some(path) => SolverConfig::load(path)?,
                None => SolverConfig::default(),
            };
            let problem_paths = get_problem_paths(&args, false)?;
            default_command(
                &problem_paths,
                get_solvers(&args),
                config,
                args.seed,
                args.parallel,
                &args.output,
            )
        }
    }
}
