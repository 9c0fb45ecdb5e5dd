use serde::{Deserialize, Serialize};

use crate::{
    model::{GuestId, Roster, Table},
    solvers::Score,
};

/// How a guest's affinity towards a group is measured.
///
/// `Mutual` counts both directions of every pair, which is exactly how much the plan score
/// changes when the guest joins the group. `Directed` only looks at the guest's own
/// preferences.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    #[default]
    Directed,
    Mutual,
}

impl Affinity {
    pub fn between(self, roster: &Roster, guest: GuestId, other: GuestId) -> i64 {
        match self {
            Affinity::Directed => roster.preference(guest, other),
            Affinity::Mutual => roster.preference(guest, other) + roster.preference(other, guest),
        }
    }
}

/// Affinity of `guest` towards `group`, skipping the guest itself if it is a member.
pub fn affinity(roster: &Roster, guest: GuestId, group: &[GuestId], mode: Affinity) -> i64 {
    group
        .iter()
        .filter(|other| **other != guest)
        .map(|other| mode.between(roster, guest, *other))
        .sum()
}

/// Sum of directed preferences over every ordered pair seated together.
pub fn table_score(roster: &Roster, guests: &[GuestId]) -> i64 {
    let mut total = 0;
    for guest in guests {
        for other in guests {
            if guest != other {
                total += roster.preference(*guest, *other);
            }
        }
    }
    total
}

/// Average ordered-pair score of a table, `None` below two guests.
pub fn table_average(roster: &Roster, guests: &[GuestId]) -> Option<f64> {
    let n = guests.len();
    if n < 2 {
        return None;
    }
    Some(table_score(roster, guests) as f64 / (n * (n - 1)) as f64)
}

pub fn score(roster: &Roster, tables: &[Table]) -> Score {
    Score(tables.iter().map(|t| table_score(roster, t.guests())).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::four_guests;

    #[test]
    fn table_score_is_order_independent() {
        let roster = four_guests();
        assert_eq!(table_score(&roster, &[0, 1, 2]), table_score(&roster, &[2, 0, 1]));
        // Alice->Bob 10, Bob->Alice 10, Alice->Charlie -5, Bob->Charlie 5
        assert_eq!(table_score(&roster, &[0, 1, 2]), 20);
    }

    #[test]
    fn mutual_affinity_matches_score_delta() {
        let roster = four_guests();
        let before = table_score(&roster, &[0, 2]);
        let after = table_score(&roster, &[0, 2, 1]);
        assert_eq!(affinity(&roster, 1, &[0, 2], Affinity::Mutual), after - before);
        assert_eq!(affinity(&roster, 1, &[0, 2], Affinity::Directed), 15);
    }

    #[test]
    fn average_needs_two_guests() {
        let roster = four_guests();
        assert_eq!(table_average(&roster, &[0]), None);
        assert_eq!(table_average(&roster, &[0, 1]), Some(10.0));
    }
}
