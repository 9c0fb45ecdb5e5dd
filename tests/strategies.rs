//! Properties every strategy has to keep, checked through the public registry.

use std::sync::Arc;

use rand::SeedableRng;
use seatplan::config::SolverConfig;
use seatplan::model::Roster;
use seatplan::solvers::{create_solver, Problem, Score, SolverRng, SOLVERS};

fn wedding() -> Problem {
    let mut roster = Roster::new();
    for (from, to, score) in [
        ("Alice", "Bob", 10),
        ("Bob", "Alice", 10),
        ("Alice", "Charlie", -5),
        ("Bob", "Charlie", 5),
        ("Bob", "David", 8),
        ("Alice", "Eve", 3),
        ("Alice", "Frank", -2),
        ("Bob", "Grace", 7),
        ("Charlie", "Heidi", 4),
        ("David", "Eve", 6),
        ("Eve", "Frank", 5),
        ("Eve", "Grace", -3),
        ("Frank", "Heidi", 2),
        ("Grace", "Alice", 1),
        ("Heidi", "Bob", 8),
    ] {
        roster.set_preference(from, to, score);
    }
    Problem::new("wedding", Arc::new(roster), 3, 3).unwrap()
}

fn quick_config() -> SolverConfig {
    let mut config = SolverConfig::default();
    config.hill_climbing.max_iterations = 500;
    config.annealing.iterations = 500;
    config.tabu.max_iterations = 100;
    config.genetic.population_size = 10;
    config.genetic.generations = 10;
    config
}

#[test]
fn every_strategy_returns_a_valid_partition() {
    let problem = wedding();
    let config = quick_config();
    for name in SOLVERS {
        for seed in 0..3 {
            let mut solver = create_solver(name, &config).unwrap();
            let solution = solver
                .solve(&problem, None, SolverRng::seed_from_u64(seed))
                .unwrap();
            solution.plan.validate().unwrap();
            assert_eq!(solution.plan.seated(), problem.roster.len(), "{name}");
            assert_eq!(solution.score, solution.plan.score(), "{name}");
        }
    }
}

#[test]
fn search_strategies_never_lose_their_best() {
    let problem = wedding();
    let config = quick_config();
    for name in ["hill_climbing", "annealing", "tabu", "genetic", "k_clustering"] {
        let mut solver = create_solver(name, &config).unwrap();
        let solution = solver
            .solve(&problem, None, SolverRng::seed_from_u64(21))
            .unwrap();
        assert!(!solution.history.is_empty(), "{name}");
        assert!(
            solution.history.windows(2).all(|w| w[0] <= w[1]),
            "{name}: {:?}",
            solution.history
        );
        assert_eq!(solution.history.last(), Some(&solution.score), "{name}");
    }
}

#[test]
fn seeded_search_starts_no_lower_than_the_seed() {
    let problem = wedding();
    let config = quick_config();
    let start = problem
        .random_plan(&mut SolverRng::seed_from_u64(99))
        .unwrap();
    for name in ["hill_climbing", "annealing", "tabu", "genetic"] {
        let mut solver = create_solver(name, &config).unwrap();
        let solution = solver
            .solve(&problem, Some(start.clone()), SolverRng::seed_from_u64(1))
            .unwrap();
        assert!(solution.score >= start.score(), "{name}");
    }
}

#[test]
fn nothing_beats_brute_force() {
    let problem = wedding();
    let config = quick_config();
    let optimum = create_solver("brute_force", &config)
        .unwrap()
        .solve(&problem, None, SolverRng::seed_from_u64(0))
        .unwrap()
        .score;
    for name in SOLVERS {
        let score = create_solver(name, &config)
            .unwrap()
            .solve(&problem, None, SolverRng::seed_from_u64(5))
            .unwrap()
            .score;
        assert!(score <= optimum, "{name} scored {score:?} over {optimum:?}");
    }
}

#[test]
fn brute_force_finds_the_couples() {
    let mut roster = Roster::new();
    roster.set_preference("Alice", "Bob", 10);
    roster.set_preference("Bob", "Alice", 10);
    roster.set_preference("Alice", "Charlie", -5);
    roster.set_preference("Bob", "Charlie", 5);
    roster.set_preference("Bob", "David", 8);
    let problem = Problem::new("couples", Arc::new(roster), 2, 2).unwrap();
    let solution = create_solver("brute_force", &SolverConfig::default())
        .unwrap()
        .solve(&problem, None, SolverRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(solution.score, Score(20));
}

#[test]
fn same_seed_same_plan() {
    let problem = wedding();
    let config = quick_config();
    for name in SOLVERS {
        let a = create_solver(name, &config)
            .unwrap()
            .solve(&problem, None, SolverRng::seed_from_u64(8))
            .unwrap();
        let b = create_solver(name, &config)
            .unwrap()
            .solve(&problem, None, SolverRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(a.plan.key(), b.plan.key(), "{name}");
        assert_eq!(a.score, b.score, "{name}");
    }
}

#[test]
fn chains_hand_over_the_best_plan() {
    let problem = wedding();
    let config = quick_config();
    let mut chain = create_solver("greedy+tabu+hill_climbing", &config).unwrap();
    assert_eq!(chain.name(), "greedy+tabu+hill_climbing");
    let solution = chain
        .solve(&problem, None, SolverRng::seed_from_u64(4))
        .unwrap();
    solution.plan.validate().unwrap();
    assert!(solution.history.windows(2).all(|w| w[0] <= w[1]));
}
