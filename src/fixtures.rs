//! Rosters shared by the unit tests.

use std::sync::Arc;

use rand::SeedableRng;

use crate::{
    model::Roster,
    plan::SeatingPlan,
    solvers::{Problem, SolverRng},
};

/// Alice(0), Bob(1), Charlie(2), David(3).
pub fn four_guests() -> Roster {
    let mut roster = Roster::new();
    for name in ["Alice", "Bob", "Charlie", "David"] {
        roster.add_guest(name);
    }
    roster.set_preference("Alice", "Bob", 10);
    roster.set_preference("Bob", "Alice", 10);
    roster.set_preference("Alice", "Charlie", -5);
    roster.set_preference("Bob", "Charlie", 5);
    roster.set_preference("Bob", "David", 8);
    roster
}

/// The eight guest wedding used by the examples in the docs.
pub fn wedding() -> Roster {
    let mut roster = four_guests();
    for (from, to, score) in [
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
    roster
}

pub fn wedding_problem() -> Problem {
    Problem::new("wedding", Arc::new(wedding()), 3, 3).unwrap()
}

pub fn rng(seed: u64) -> SolverRng {
    SolverRng::seed_from_u64(seed)
}

pub fn random_plan(problem: &Problem, seed: u64) -> SeatingPlan {
    problem.random_plan(&mut rng(seed)).unwrap()
}
