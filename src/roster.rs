//! Scouted-team roster: players, role tags, and roster normalization.

use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// Role tag relevant to rotation and libero logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Any player without a special tag.
    #[default]
    Regular,
    /// Middle blocker, replaced by the libero in the back row.
    Middle,
    /// Designated libero.
    Libero,
    /// Setter, used for the rotation label.
    Setter,
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    /// Case-insensitive, English or Italian roster sheet tags; unknown or
    /// blank tags are `Regular`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_lowercase().as_str() {
            "middle" | "middle blocker" | "mb" | "centrale" => Role::Middle,
            "libero" | "l" => Role::Libero,
            "setter" | "s" | "palleggiatrice" | "palleggiatore" | "alzatrice" => Role::Setter,
            _ => Role::Regular,
        })
    }
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within the roster.
    pub name: PlayerId,
    /// Jersey number, when known.
    pub number: Option<u32>,
    /// Role tag.
    #[serde(default)]
    pub role: Role,
}

impl Player {
    /// Convenience constructor.
    pub fn new(name: impl Into<PlayerId>, number: Option<u32>, role: Role) -> Self {
        Self {
            name: name.into(),
            number,
            role,
        }
    }
}

/// Raw roster row as read from an external sheet or form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterRow {
    /// Jersey number cell, possibly blank or non-numeric.
    #[serde(default)]
    pub number: String,
    /// Name cell.
    #[serde(default)]
    pub name: String,
    /// Role cell.
    #[serde(default)]
    pub role: String,
}

/// Roster validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// Two players share a name.
    #[error("duplicate player name in roster: {0}")]
    DuplicateName(PlayerId),
}

/// Ordered player list with a name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Player>", into = "Vec<Player>")]
pub struct Roster {
    players: Vec<Player>,
    by_name: HashMap<PlayerId, usize>,
}

impl Roster {
    /// Builds a roster; names must be unique.
    pub fn new(players: Vec<Player>) -> Result<Self, RosterError> {
        let mut by_name = HashMap::with_capacity(players.len());
        for (idx, p) in players.iter().enumerate() {
            if by_name.insert(p.name.clone(), idx).is_some() {
                return Err(RosterError::DuplicateName(p.name.clone()));
            }
        }
        Ok(Self { players, by_name })
    }

    /// Normalizes raw rows: trims cells, drops rows with a blank name,
    /// coerces non-numeric numbers to `None`.
    pub fn from_rows(rows: impl IntoIterator<Item = RosterRow>) -> Result<Self, RosterError> {
        let players = rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name.trim();
                if name.is_empty() {
                    return None;
                }
                let role = row.role.parse().unwrap_or_default();
                Some(Player::new(name, row.number.trim().parse().ok(), role))
            })
            .collect();
        Self::new(players)
    }

    /// Player by name.
    pub fn get(&self, name: &str) -> Option<&Player> {
        self.by_name.get(name).map(|idx| &self.players[*idx])
    }

    /// True if `name` is on the roster.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Role of `name`.
    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.get(name).map(|p| p.role)
    }

    /// True if `name` is tagged as a middle.
    pub fn is_middle(&self, name: &str) -> bool {
        self.role_of(name) == Some(Role::Middle)
    }

    /// Players in roster order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players tagged with `role`, in roster order.
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.role == role)
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True for an empty roster.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl TryFrom<Vec<Player>> for Roster {
    type Error = RosterError;

    fn try_from(value: Vec<Player>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Roster> for Vec<Player> {
    fn from(value: Roster) -> Self {
        value.players
    }
}
