//! Neighbourhood moves over a [`SeatingPlan`].
//!
//! The free functions edit a plan in place and report whether anything changed; a move whose
//! preconditions do not hold (too few occupied tables, no free seat) leaves the plan
//! untouched. [`Perturbation::apply`] is the copy-producing entry point used by the search
//! strategies.

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::{
    model::GuestId,
    plan::SeatingPlan,
    scorer::{self, Affinity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Perturbation {
    Swap,
    Move,
    ReassignCluster,
    TableShuffle,
    TargetedMove,
}

impl Perturbation {
    pub const ALL: [Perturbation; 5] = [
        Perturbation::Swap,
        Perturbation::Move,
        Perturbation::ReassignCluster,
        Perturbation::TableShuffle,
        Perturbation::TargetedMove,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Perturbation::Swap => "swap",
            Perturbation::Move => "move",
            Perturbation::ReassignCluster => "reassign_cluster",
            Perturbation::TableShuffle => "table_shuffle",
            Perturbation::TargetedMove => "targeted_move",
        }
    }

    /// Returns an edited copy of `plan`; the original is never touched.
    pub fn apply<R: Rng + ?Sized>(self, plan: &SeatingPlan, rng: &mut R) -> SeatingPlan {
        let mut next = plan.clone();
        self.apply_in_place(&mut next, rng);
        next
    }

    pub fn apply_in_place<R: Rng + ?Sized>(self, plan: &mut SeatingPlan, rng: &mut R) -> bool {
        match self {
            Perturbation::Swap => swap(plan, rng),
            Perturbation::Move => relocate(plan, rng),
            Perturbation::ReassignCluster => reassign_cluster(plan, rng),
            Perturbation::TableShuffle => shuffle_tables(plan, rng),
            Perturbation::TargetedMove => targeted_move(plan),
        }
    }
}

fn random_guest<R: Rng + ?Sized>(plan: &SeatingPlan, table: usize, rng: &mut R) -> Option<GuestId> {
    plan.table(table).guests().choose(rng).copied()
}

/// Exchanges one random guest between two distinct occupied tables.
pub fn swap<R: Rng + ?Sized>(plan: &mut SeatingPlan, rng: &mut R) -> bool {
    let occupied = plan.occupied_tables();
    if occupied.len() < 2 {
        return false;
    }
    let picked: Vec<usize> = occupied.choose_multiple(rng, 2).copied().collect();
    let (table_a, table_b) = (picked[0], picked[1]);
    match (random_guest(plan, table_a, rng), random_guest(plan, table_b, rng)) {
        (Some(a), Some(b)) => plan.swap_guests(table_a, a, table_b, b),
        _ => false,
    }
}

/// Moves one random guest to a different table that still has a free seat.
pub fn relocate<R: Rng + ?Sized>(plan: &mut SeatingPlan, rng: &mut R) -> bool {
    let Some(source) = plan.occupied_tables().choose(rng).copied() else {
        return false;
    };
    let targets: Vec<usize> = (0..plan.num_tables())
        .filter(|idx| *idx != source && !plan.table(*idx).is_full())
        .collect();
    let (Some(target), Some(guest)) = (targets.choose(rng).copied(), random_guest(plan, source, rng))
    else {
        return false;
    };
    plan.move_guest(guest, source, target)
}

/// Moves a group of 2..=5 guests from one table to another table with room for all of them.
pub fn reassign_cluster<R: Rng + ?Sized>(plan: &mut SeatingPlan, rng: &mut R) -> bool {
    let sources: Vec<usize> = (0..plan.num_tables())
        .filter(|idx| plan.table(*idx).len() >= 2)
        .collect();
    let Some(source) = sources.choose(rng).copied() else {
        return false;
    };

    let max_group = plan.table(source).len().min(5);
    let mut size = rng.gen_range(2..=max_group);
    let target = loop {
        let targets: Vec<usize> = (0..plan.num_tables())
            .filter(|idx| *idx != source && plan.table(*idx).free_seats() >= size)
            .collect();
        if let Some(target) = targets.choose(rng).copied() {
            break target;
        }
        if size == 2 {
            return false;
        }
        size -= 1;
    };

    let group: Vec<GuestId> = plan
        .table(source)
        .guests()
        .choose_multiple(rng, size)
        .copied()
        .collect();
    for guest in group {
        plan.move_guest(guest, source, target);
    }
    true
}

/// Pools the guests of 2..=3 random tables and deals them back out in random order.
pub fn shuffle_tables<R: Rng + ?Sized>(plan: &mut SeatingPlan, rng: &mut R) -> bool {
    if plan.num_tables() < 2 {
        return false;
    }
    let count = rng.gen_range(2..=plan.num_tables().min(3));
    let all: Vec<usize> = (0..plan.num_tables()).collect();
    let chosen: Vec<usize> = all.choose_multiple(rng, count).copied().collect();

    let snapshot = plan.clone();
    let mut pool: Vec<GuestId> = chosen
        .iter()
        .flat_map(|idx| plan.table_mut(*idx).clear())
        .collect();
    pool.shuffle(rng);

    let mut cursor = 0;
    for guest in pool {
        let in_chosen = (0..chosen.len())
            .map(|offset| chosen[(cursor + offset) % chosen.len()])
            .find(|idx| !plan.table(*idx).is_full());
        let target = match in_chosen {
            Some(idx) => Some(idx),
            None => (0..plan.num_tables()).find(|idx| !plan.table(*idx).is_full()),
        };
        match target {
            Some(idx) => {
                plan.seat(idx, guest);
                cursor += 1;
            }
            None => {
                *plan = snapshot;
                return false;
            }
        }
    }
    true
}

/// Takes the least compatible guest from the worst table and seats it where it fits best.
pub fn targeted_move(plan: &mut SeatingPlan) -> bool {
    let roster = plan.roster().clone();

    let worst = (0..plan.num_tables())
        .filter_map(|idx| scorer::table_average(&roster, plan.table(idx).guests()).map(|avg| (idx, avg)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx);
    let Some(worst) = worst else {
        return false;
    };

    let tablemates = plan.table(worst).guests();
    let guest = tablemates
        .iter()
        .copied()
        .min_by_key(|g| (scorer::affinity(&roster, *g, tablemates, Affinity::Mutual), *g));
    let Some(guest) = guest else {
        return false;
    };

    let target = (0..plan.num_tables())
        .filter(|idx| *idx != worst && !plan.table(*idx).is_full())
        .max_by_key(|idx| {
            (
                scorer::affinity(&roster, guest, plan.table(*idx).guests(), Affinity::Mutual),
                std::cmp::Reverse(*idx),
            )
        });
    match target {
        Some(target) => plan.move_guest(guest, worst, target),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixtures::{four_guests, random_plan, rng, wedding_problem};

    #[test]
    fn every_operator_preserves_partition() {
        let problem = wedding_problem();
        let mut rng = rng(7);
        for seed in 0..10 {
            let mut plan = random_plan(&problem, seed);
            for _ in 0..200 {
                for op in Perturbation::ALL {
                    let next = op.apply(&plan, &mut rng);
                    next.validate().unwrap();
                    plan = next;
                }
            }
        }
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let problem = wedding_problem();
        let plan = random_plan(&problem, 3);
        let key = plan.key();
        let mut rng = rng(11);
        for op in Perturbation::ALL {
            let _ = op.apply(&plan, &mut rng);
        }
        assert_eq!(plan.key(), key);
    }

    #[test]
    fn single_occupied_table_is_a_no_op() {
        let roster = Arc::new(four_guests());
        let mut plan =
            SeatingPlan::from_tables(roster, 4, vec![vec![0, 1, 2, 3], vec![]]).unwrap();
        let key = plan.key();
        let mut rng = rng(5);
        assert!(!swap(&mut plan, &mut rng));
        assert_eq!(plan.key(), key);
    }

    #[test]
    fn full_tables_block_moves() {
        let roster = Arc::new(four_guests());
        let mut plan =
            SeatingPlan::from_tables(roster, 2, vec![vec![0, 1], vec![2, 3]]).unwrap();
        let key = plan.key();
        let mut rng = rng(5);
        assert!(!relocate(&mut plan, &mut rng));
        assert!(!reassign_cluster(&mut plan, &mut rng));
        assert!(!targeted_move(&mut plan));
        assert_eq!(plan.key(), key);
    }

    #[test]
    fn targeted_move_relocates_the_outsider() {
        // Alice and Charlie clash at table 0; the tie goes to Alice, who joins Bob.
        let roster = Arc::new(four_guests());
        let mut plan =
            SeatingPlan::from_tables(roster, 3, vec![vec![0, 2], vec![1, 3]]).unwrap();
        let before = plan.score();
        assert!(targeted_move(&mut plan));
        assert_eq!(plan.table_of(0), Some(1));
        assert_eq!(plan.table(0).guests(), &[2]);
        assert!(plan.score() > before);
    }

    #[test]
    fn cluster_moves_keep_group_together() {
        let roster = Arc::new(four_guests());
        let mut plan =
            SeatingPlan::from_tables(roster, 4, vec![vec![0, 1], vec![], vec![2, 3]]).unwrap();
        let mut rng = rng(9);
        assert!(reassign_cluster(&mut plan, &mut rng));
        plan.validate().unwrap();
        assert_eq!(plan.table_of(0), plan.table_of(1));
        assert_eq!(plan.table_of(2), plan.table_of(3));
    }
}
