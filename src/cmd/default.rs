use std::{
    cmp::Ordering,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{info, warn};
use rayon::prelude::{ParallelBridge, ParallelIterator};

use seatplan::{
    config::SolverConfig,
    dto::ReportRowDto,
    runner::{RunReport, Runner},
    solvers::{Problem, Solution},
};

fn save_solution(
    report: &RunReport,
    solution: &Solution,
    problem: &Problem,
    base_solution_dir: &Path,
) -> std::io::Result<()> {
    let cur_solver_dir = &base_solution_dir.join("current").join(&report.strategy);
    let best_dir = &base_solution_dir.join("best");
    std::fs::create_dir_all(cur_solver_dir)?;
    std::fs::create_dir_all(best_dir)?;

    // write the solution
    solution.save(report.strategy.clone(), problem, cur_solver_dir)?;

    // compare with the best solution
    let best_sol = match Solution::load(best_dir, problem) {
        Ok(sol) => Some(sol),
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(ref e) if e.kind() == std::io::ErrorKind::InvalidData => {
            warn!("{}: best solution no longer fits, replacing it: {}", problem.id, e);
            None
        }
        Err(e) => return Err(e),
    };

    let new_best_sol = match &best_sol {
        Some((_, best_sol)) => solution.score.0.cmp(&best_sol.score),
        None => Ordering::Greater,
    };

    if new_best_sol == Ordering::Greater {
        solution.save(report.strategy.clone(), problem, best_dir)?;
    }

    match (&best_sol, &new_best_sol) {
        // new best
        (Some((_, best_sol)), Ordering::Greater) => {
            let improvement = solution.score.0 - best_sol.score;
            println!(
                "new best, improvement of {}! previous best: {} ({})",
                improvement, best_sol.score, best_sol.solver_name
            );
        }
        (Some((_, _)), Ordering::Equal) => {
            println!("ties current best");
        }
        (Some((_, best_sol)), Ordering::Less) => {
            println!("worse than best: {}", best_sol.score);
        }
        // first solution ever
        (None, _) => {
            println!("first solution");
        }
    }
    Ok(())
}

fn write_report(rows: &[ReportRowDto], problem: &Problem, base_solution_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(base_solution_dir)?;
    let path = base_solution_dir.join(format!("{}_report.json", problem.id));
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

fn solve_problem(runner: &Runner, base_solution_dir: &Path, problem_path: &Path) -> std::io::Result<()> {
    let problem = Problem::load(problem_path)?;
    let reports = runner.run(&problem)?;

    for report in &reports {
        let prefix = format!("{:15}{}:", format!("[{}]", problem.id), report.strategy);
        match &report.outcome {
            Ok(solution) => {
                print!(
                    "{} {} in {:.3}s, ",
                    prefix,
                    solution.score.0,
                    solution.elapsed.as_secs_f64()
                );
                save_solution(report, solution, &problem, base_solution_dir)?;
                info!("{}({}):\n{}", report.strategy, problem.id, solution.plan);
            }
            Err(e) => println!("{} failed: {}", prefix, e),
        }
    }

    let best = reports
        .iter()
        .filter_map(|r| r.score().map(|s| (s, &r.strategy)))
        .max_by_key(|(s, _)| *s);
    if let Some((score, strategy)) = best {
        println!("{:15}best of run: {} ({})", format!("[{}]", problem.id), score, strategy);
    }

    let rows: Vec<ReportRowDto> = reports.iter().map(RunReport::row).collect();
    write_report(&rows, &problem, base_solution_dir)
}

pub fn default_command(
    problem_paths: &[PathBuf],
    solvers: Vec<String>,
    config: SolverConfig,
    seed: Option<u64>,
    parallel: bool,
    base_solution_dir: &Path,
) -> std::io::Result<()> {
    let runner = Runner::new(solvers, config)
        .with_seed(seed)
        .parallel(parallel);

    if parallel {
        problem_paths
            .iter()
            .par_bridge()
            .map(|problem_path| solve_problem(&runner, base_solution_dir, problem_path))
            .collect::<std::io::Result<()>>()
    } else {
        #[allow(clippy::map_collect_result_unit)]
        problem_paths
            .iter()
            .map(|problem_path| solve_problem(&runner, base_solution_dir, problem_path))
            .collect::<std::io::Result<()>>()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use seatplan::{
        config::SolverConfig,
        model::Roster,
        runner::Runner,
        solvers::{Problem, Solution},
    };

    use super::save_solution;

    fn party(first: &str, second: &str, score: i64) -> Problem {
        let mut roster = Roster::new();
        roster.set_preference(first, second, score);
        Problem::new("party", Arc::new(roster), 1, 2).unwrap()
    }

    #[test]
    fn best_from_another_roster_is_replaced() {
        let dir = std::env::temp_dir().join(format!("seatplan-stale-{}", std::process::id()));
        for problem in [party("Ann", "Ben", 50), party("Cat", "Dan", 3)] {
            let reports = Runner::new(vec!["greedy".to_owned()], SolverConfig::default())
                .with_seed(Some(0))
                .run(&problem)
                .unwrap();
            let report = &reports[0];
            save_solution(report, report.outcome.as_ref().unwrap(), &problem, &dir).unwrap();
        }

        let (plan, meta) = Solution::load(&dir.join("best"), &party("Cat", "Dan", 3)).unwrap();
        assert_eq!(meta.score, 3);
        assert_eq!(plan.seated(), 2);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
