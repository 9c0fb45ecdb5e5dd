use std::{fmt, sync::Arc};

use derivative::Derivative;
use rand::{seq::SliceRandom, Rng};

use crate::{
    dto::SolutionDto,
    error::{ConfigurationError, InvalidPlanError, SeatingError},
    model::{GuestId, Roster, Table},
    scorer,
    solvers::Score,
};

/// Canonical fingerprint of a partition: sorted guests per table, tables sorted.
///
/// Two plans seating the same groups have the same key no matter how their tables or the
/// guests inside them are ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanKey(Vec<Vec<GuestId>>);

/// Assignment of every roster guest to exactly one table.
///
/// Cloning copies the table membership; the roster itself is shared.
#[derive(Derivative, Clone, Default)]
#[derivative(Debug)]
pub struct SeatingPlan {
    tables: Vec<Table>,
    capacity: usize,
    #[derivative(Debug = "ignore")]
    roster: Arc<Roster>,
}

pub fn check_layout(guests: usize, num_tables: usize, capacity: usize) -> Result<(), ConfigurationError> {
    if num_tables == 0 {
        return Err(ConfigurationError::NoTables);
    }
    if capacity == 0 {
        return Err(ConfigurationError::ZeroCapacity);
    }
    // An overflowing product always exceeds any roster size.
    let seats = num_tables.saturating_mul(capacity);
    if seats < guests {
        return Err(ConfigurationError::InsufficientSeats { guests, seats });
    }
    Ok(())
}

impl SeatingPlan {
    /// A plan with `num_tables` empty tables, to be filled by a construction strategy.
    pub fn empty(roster: Arc<Roster>, num_tables: usize, capacity: usize) -> Self {
        SeatingPlan {
            tables: (0..num_tables).map(|_| Table::new(capacity)).collect(),
            capacity,
            roster,
        }
    }

    /// Shuffles a copy of the roster and deals it round-robin, skipping full tables.
    pub fn random<R: Rng + ?Sized>(
        roster: Arc<Roster>,
        num_tables: usize,
        capacity: usize,
        rng: &mut R,
    ) -> Result<Self, SeatingError> {
        check_layout(roster.len(), num_tables, capacity)?;
        let mut order: Vec<GuestId> = roster.ids().collect();
        order.shuffle(rng);

        let mut plan = SeatingPlan::empty(roster, num_tables, capacity);
        let mut table_idx = 0;
        for guest in order {
            while !plan.tables[table_idx].add_guest(guest) {
                table_idx = (table_idx + 1) % num_tables;
            }
            table_idx = (table_idx + 1) % num_tables;
        }
        Ok(plan)
    }

    /// Builds a plan from explicit table contents, checking every partition invariant.
    pub fn from_tables(
        roster: Arc<Roster>,
        capacity: usize,
        tables: Vec<Vec<GuestId>>,
    ) -> Result<Self, SeatingError> {
        check_layout(roster.len(), tables.len(), capacity)?;
        let mut plan = SeatingPlan::empty(roster, tables.len(), capacity);
        for (idx, guests) in tables.into_iter().enumerate() {
            if guests.len() > capacity {
                return Err(InvalidPlanError::OverCapacity {
                    table: idx,
                    size: guests.len(),
                    capacity,
                }
                .into());
            }
            for guest in guests {
                if guest >= plan.roster.len() {
                    return Err(InvalidPlanError::UnknownGuest(format!("#{guest}")).into());
                }
                plan.tables[idx].add_guest(guest);
            }
        }
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_dto(
        roster: Arc<Roster>,
        capacity: usize,
        dto: &SolutionDto,
    ) -> Result<Self, SeatingError> {
        let tables = dto
            .tables
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        roster
                            .id_of(name)
                            .ok_or_else(|| InvalidPlanError::UnknownGuest(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        SeatingPlan::from_tables(roster, capacity, tables)
    }

    pub fn to_dto(&self) -> SolutionDto {
        SolutionDto {
            tables: self
                .tables
                .iter()
                .map(|t| t.guests().iter().map(|g| self.roster.name(*g).to_owned()).collect())
                .collect(),
        }
    }

    /// Checks that every guest sits exactly once and no table is over capacity.
    pub fn validate(&self) -> Result<(), InvalidPlanError> {
        let mut seen = vec![false; self.roster.len()];
        for (idx, table) in self.tables.iter().enumerate() {
            if table.len() > self.capacity {
                return Err(InvalidPlanError::OverCapacity {
                    table: idx,
                    size: table.len(),
                    capacity: self.capacity,
                });
            }
            for guest in table.guests() {
                if std::mem::replace(&mut seen[*guest], true) {
                    return Err(InvalidPlanError::DuplicatedGuest(
                        self.roster.name(*guest).to_owned(),
                    ));
                }
            }
        }
        match seen.iter().position(|s| !s) {
            Some(missing) => Err(InvalidPlanError::MissingGuest(
                self.roster.name(missing).to_owned(),
            )),
            None => Ok(()),
        }
    }

    pub fn score(&self) -> Score {
        scorer::score(&self.roster, &self.tables)
    }

    pub fn key(&self) -> PlanKey {
        let mut tables: Vec<Vec<GuestId>> = self
            .tables
            .iter()
            .map(|t| {
                let mut guests = t.guests().to_vec();
                guests.sort_unstable();
                guests
            })
            .collect();
        tables.sort_unstable();
        PlanKey(tables)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, idx: usize) -> &Table {
        &self.tables[idx]
    }

    pub(crate) fn table_mut(&mut self, idx: usize) -> &mut Table {
        &mut self.tables[idx]
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn seated(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }

    pub fn table_of(&self, guest: GuestId) -> Option<usize> {
        self.tables.iter().position(|t| t.contains(guest))
    }

    /// Seats `guest` at table `idx`. Returns `false` if the table is full.
    pub fn seat(&mut self, idx: usize, guest: GuestId) -> bool {
        self.tables[idx].add_guest(guest)
    }

    /// Moves `guest` from table `from` to table `to`; nothing changes if it is not seated at
    /// `from` or `to` is full.
    pub fn move_guest(&mut self, guest: GuestId, from: usize, to: usize) -> bool {
        if from == to || self.tables[to].is_full() || !self.tables[from].remove_guest(guest) {
            return false;
        }
        self.tables[to].add_guest(guest)
    }

    /// Exchanges `a` (seated at `table_a`) with `b` (seated at `table_b`).
    pub fn swap_guests(&mut self, table_a: usize, a: GuestId, table_b: usize, b: GuestId) -> bool {
        if table_a == table_b || !self.tables[table_a].contains(a) || !self.tables[table_b].contains(b)
        {
            return false;
        }
        self.tables[table_a].remove_guest(a);
        self.tables[table_b].remove_guest(b);
        self.tables[table_a].add_guest(b);
        self.tables[table_b].add_guest(a);
        true
    }

    /// Indices of tables that seat at least one guest.
    pub fn occupied_tables(&self) -> Vec<usize> {
        (0..self.tables.len())
            .filter(|idx| !self.tables[*idx].is_empty())
            .collect()
    }
}

impl fmt::Display for SeatingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, table) in self.tables.iter().enumerate() {
            let names: Vec<&str> = table.guests().iter().map(|g| self.roster.name(*g)).collect();
            writeln!(f, "Table {idx}: [{}]", names.join(", "))?;
        }
        Ok(())
    }
}
