//! Shared primitive IDs, teams, and court slots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic event sequence number, unique within a ledger.
pub type EventSeq = u64;
/// Monotonic journal operation sequence number.
pub type OpSeq = u64;
/// One-based set number.
pub type SetNumber = u32;
/// Player identity. Names are unique within a roster.
pub type PlayerId = String;

/// One of the two teams on court. `A` is always the scouted team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Scouted team, the one with a tracked lineup.
    A,
    /// Opposing team, modeled opaquely.
    B,
}

impl Team {
    /// Returns the opposing team.
    pub fn other(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => f.write_str("A"),
            Team::B => f.write_str("B"),
        }
    }
}

/// Rotational court position, 1 through 6.
///
/// Slot 1 is the server's position; slots 2, 3, 4 form the front row and
/// 5, 6, 1 the back row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

impl Slot {
    /// All six slots in ascending order.
    pub const ALL: [Slot; 6] = [Slot(1), Slot(2), Slot(3), Slot(4), Slot(5), Slot(6)];
    /// Server slot.
    pub const SERVER: Slot = Slot(1);

    /// Builds a slot from its court number; `None` outside 1..=6.
    pub fn new(n: u8) -> Option<Self> {
        (1..=6).contains(&n).then_some(Self(n))
    }

    /// Court number 1..=6.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based array index.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// True for slots 2, 3 and 4.
    pub fn is_front_row(self) -> bool {
        matches!(self.0, 2..=4)
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Slot::new(value).ok_or_else(|| format!("slot out of range: {value}"))
    }
}

impl From<Slot> for u8 {
    fn from(value: Slot) -> Self {
        value.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
