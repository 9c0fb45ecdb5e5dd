//! Portfolio runs and the file formats around them.

use std::{fs, path::PathBuf};

use seatplan::config::SolverConfig;
use seatplan::dto::ProblemDto;
use seatplan::error::{ConfigurationError, SeatingError, UnknownStrategyError};
use seatplan::runner::Runner;
use seatplan::solvers::{Problem, Solution};

const PROBLEM_JSON: &str = r#"{
    "table_capacity": 3,
    "guests": ["Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Heidi"],
    "preferences": [
        {"guest": "Alice", "other": "Bob", "score": 10},
        {"guest": "Bob", "other": "Alice", "score": 10},
        {"guest": "Alice", "other": "Charlie", "score": -5},
        {"guest": "Bob", "other": "Charlie", "score": 5},
        {"guest": "Bob", "other": "David", "score": 8},
        {"guest": "David", "other": "Eve", "score": 6},
        {"guest": "Eve", "other": "Frank", "score": 5},
        {"guest": "Heidi", "other": "Bob", "score": 8}
    ]
}"#;

fn problem() -> Problem {
    let data: ProblemDto = serde_json::from_str(PROBLEM_JSON).unwrap();
    Problem::from_dto("wedding", &data).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("seatplan-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn failing_strategies_are_reported_not_fatal() {
    let mut config = SolverConfig::default();
    config.brute_force.max_guests = 4;
    let runner = Runner::new(names(&["greedy", "brute_force", "simplex", "tabu"]), config)
        .with_seed(Some(3));
    let reports = runner.run(&problem()).unwrap();

    let order: Vec<&str> = reports.iter().map(|r| r.strategy.as_str()).collect();
    assert_eq!(order, ["greedy", "brute_force", "simplex", "tabu"]);

    assert!(reports[0].outcome.is_ok());
    assert_eq!(
        reports[1].outcome.as_ref().unwrap_err(),
        &SeatingError::Configuration(ConfigurationError::TooManyGuests {
            guests: 8,
            limit: 4
        })
    );
    assert_eq!(
        reports[2].outcome.as_ref().unwrap_err(),
        &SeatingError::UnknownStrategy(UnknownStrategyError {
            name: "simplex".into()
        })
    );
    assert!(reports[3].outcome.is_ok());

    let rows: Vec<_> = reports.iter().map(|r| r.row()).collect();
    assert_eq!(rows[1].best_score, None);
    assert!(rows[1].error.as_deref().unwrap().contains("limit of 4"));
    assert_eq!(rows[3].best_score, reports[3].score());
    assert_eq!(rows[3].seating_plan.as_ref().unwrap().tables.len(), 3);
}

#[test]
fn parallel_and_sequential_runs_agree_under_a_seed() {
    let mut config = SolverConfig::default();
    config.annealing.iterations = 300;
    config.genetic.generations = 5;
    let strategies = names(&["hill_climbing", "annealing", "genetic", "k_clustering"]);
    let sequential = Runner::new(strategies.clone(), config.clone())
        .with_seed(Some(17))
        .run(&problem())
        .unwrap();
    let parallel = Runner::new(strategies, config)
        .with_seed(Some(17))
        .parallel(true)
        .run(&problem())
        .unwrap();
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(a.strategy, b.strategy);
        let (a, b) = (a.outcome.as_ref().unwrap(), b.outcome.as_ref().unwrap());
        assert_eq!(a.plan.key(), b.plan.key());
    }
}

#[test]
fn impossible_layout_fails_the_whole_run() {
    let mut data: ProblemDto = serde_json::from_str(PROBLEM_JSON).unwrap();
    data.num_tables = Some(2);
    let err = Problem::from_dto("crowded", &data).unwrap_err();
    assert_eq!(
        err,
        SeatingError::Configuration(ConfigurationError::InsufficientSeats {
            guests: 8,
            seats: 6
        })
    );
}

#[test]
fn problem_and_solution_files_round_trip() {
    let dir = scratch_dir("files");
    let problem_path = dir.join("wedding.json");
    fs::write(&problem_path, PROBLEM_JSON).unwrap();

    let problem = Problem::load(&problem_path).unwrap();
    assert_eq!(problem.id, "wedding");
    assert_eq!(problem.num_tables, 3);

    let reports = Runner::new(names(&["greedy"]), SolverConfig::default())
        .with_seed(Some(1))
        .run(&problem)
        .unwrap();
    let solution = reports[0].outcome.as_ref().unwrap();
    solution.save("greedy".into(), &problem, &dir).unwrap();

    let (plan, meta) = Solution::load(&dir, &problem).unwrap();
    assert_eq!(meta.solver_name, "greedy");
    assert_eq!(meta.score, solution.score.0);
    assert_eq!(plan.key(), solution.plan.key());

    fs::remove_dir_all(dir).unwrap();
}
