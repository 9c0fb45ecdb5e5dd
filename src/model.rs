use std::collections::HashMap;

/// Dense guest identifier: the guest's index in its [`Roster`].
pub type GuestId = usize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    preferences: HashMap<GuestId, i64>,
}

impl Guest {
    pub fn new(id: GuestId, name: impl Into<String>) -> Self {
        Guest {
            id,
            name: name.into(),
            preferences: HashMap::new(),
        }
    }

    pub fn set_preference(&mut self, other: GuestId, score: i64) {
        self.preferences.insert(other, score);
    }

    /// Directed preference towards `other`, 0 when unset.
    pub fn preference(&self, other: GuestId) -> i64 {
        self.preferences.get(&other).copied().unwrap_or(0)
    }

    pub fn preferences(&self) -> impl Iterator<Item = (GuestId, i64)> + '_ {
        self.preferences.iter().map(|(id, score)| (*id, *score))
    }

    pub fn preference_sum(&self) -> i64 {
        self.preferences.values().sum()
    }

    /// Sum of the `k` highest outgoing preferences.
    pub fn top_preference_sum(&self, k: usize) -> i64 {
        let mut scores: Vec<i64> = self.preferences.values().copied().collect();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.into_iter().take(k).sum()
    }
}

/// The full guest list. Ids are assigned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    guests: Vec<Guest>,
    by_name: HashMap<String, GuestId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a guest, or returns the id of the existing guest with that name.
    pub fn add_guest(&mut self, name: &str) -> GuestId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = self.guests.len();
        self.guests.push(Guest::new(id, name));
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Sets `from`'s preference for `to`, adding either guest if unknown.
    /// A later call for the same pair overwrites the earlier one.
    pub fn set_preference(&mut self, from: &str, to: &str, score: i64) {
        let from = self.add_guest(from);
        let to = self.add_guest(to);
        self.guests[from].set_preference(to, score);
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn guest(&self, id: GuestId) -> &Guest {
        &self.guests[id]
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    pub fn ids(&self) -> impl Iterator<Item = GuestId> {
        0..self.guests.len()
    }

    pub fn id_of(&self, name: &str) -> Option<GuestId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: GuestId) -> &str {
        &self.guests[id].name
    }

    pub fn preference(&self, from: GuestId, to: GuestId) -> i64 {
        self.guests[from].preference(to)
    }
}

/// A capacity-bounded, unordered group of guests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    capacity: usize,
    guests: Vec<GuestId>,
}

impl Table {
    pub fn new(capacity: usize) -> Self {
        Table {
            capacity,
            guests: Vec::new(),
        }
    }

    /// Seats `guest` unless the table is full. Returns whether it was seated.
    pub fn add_guest(&mut self, guest: GuestId) -> bool {
        if self.is_full() {
            return false;
        }
        self.guests.push(guest);
        true
    }

    pub fn remove_guest(&mut self, guest: GuestId) -> bool {
        match self.guests.iter().position(|g| *g == guest) {
            Some(idx) => {
                self.guests.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, guest: GuestId) -> bool {
        self.guests.contains(&guest)
    }

    pub fn is_full(&self) -> bool {
        self.guests.len() >= self.capacity
    }

    pub fn free_seats(&self) -> usize {
        self.capacity.saturating_sub(self.guests.len())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn guests(&self) -> &[GuestId] {
        &self.guests
    }

    /// Empties the table and hands back its former occupants.
    pub fn clear(&mut self) -> Vec<GuestId> {
        std::mem::take(&mut self.guests)
    }
}
