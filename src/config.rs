//! Match configuration: roster, per-set starting lineups and servers.
//!
//! Configuration is the only input to derivation besides the ledger. It is
//! loaded from JSON and may hold incomplete lineups while the operator is
//! still filling them in; completeness is checked when a set is evaluated.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    engine::{lineup::LineupDraft, rotation::RotationPolicy},
    roster::{Roster, RosterError},
    types::{SetNumber, Team},
};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for this schema.
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    /// Roster failed validation.
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// A set number of zero was supplied.
    #[error("set numbers start at 1")]
    ZeroSet,
}

/// Display names for the two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamNames {
    /// Scouted team.
    pub a: String,
    /// Opponent.
    pub b: String,
}

impl Default for TeamNames {
    fn default() -> Self {
        Self {
            a: "Team A".to_string(),
            b: "Team B".to_string(),
        }
    }
}

impl TeamNames {
    /// Display name of `team`.
    pub fn name(&self, team: Team) -> &str {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }
}

/// Initial conditions of one set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    /// Team serving the first rally.
    #[serde(default = "default_server")]
    pub starting_server: Team,
    /// Scouted team's lineup at the first rally.
    #[serde(default)]
    pub starting_lineup: LineupDraft,
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            starting_server: default_server(),
            starting_lineup: LineupDraft::default(),
        }
    }
}

fn default_server() -> Team {
    Team::A
}

fn default_set() -> SetNumber {
    1
}

/// Everything the engines need besides the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Team display names.
    #[serde(default)]
    pub team_names: TeamNames,
    /// Set new events are recorded into.
    #[serde(default = "default_set")]
    pub current_set: SetNumber,
    /// Scouted team's roster.
    #[serde(default)]
    pub roster: Roster,
    /// Per-set initial conditions. A set without an entry reuses the closest
    /// earlier one.
    #[serde(default)]
    pub sets: BTreeMap<SetNumber, SetConfig>,
    /// When the scouted lineup rotates.
    #[serde(default)]
    pub rotation_policy: RotationPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            team_names: TeamNames::default(),
            current_set: default_set(),
            roster: Roster::default(),
            sets: BTreeMap::new(),
            rotation_policy: RotationPolicy::default(),
        }
    }
}

impl MatchConfig {
    /// Single-set configuration, the common case while scouting live.
    pub fn new(roster: Roster, starting_server: Team, starting_lineup: LineupDraft) -> Self {
        let mut sets = BTreeMap::new();
        sets.insert(
            1,
            SetConfig {
                starting_server,
                starting_lineup,
            },
        );
        Self {
            roster,
            sets,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects set number zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.current_set == 0 || self.sets.contains_key(&0) {
            return Err(ConfigError::ZeroSet);
        }
        Ok(())
    }

    /// Initial conditions for `set`, falling back to the closest earlier set.
    pub fn set_config(&self, set: SetNumber) -> Option<&SetConfig> {
        self.sets.range(..=set).next_back().map(|(_, cfg)| cfg)
    }

    /// Mutable entry for `set`, created from the fallback when absent.
    pub fn set_config_mut(&mut self, set: SetNumber) -> &mut SetConfig {
        let seed = self.set_config(set).cloned().unwrap_or_default();
        self.sets.entry(set).or_insert(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_json_and_falls_back_to_earlier_set() {
        let cfg = MatchConfig::from_json_str(
            r#"{
                "team_names": {"a": "Home", "b": "Away"},
                "current_set": 2,
                "roster": [
                    {"name": "Anna", "number": 1, "role": "Setter"},
                    {"name": "Bea", "number": 2}
                ],
                "sets": {"1": {"starting_server": "B"}}
            }"#,
        )
        .expect("config");

        assert_eq!(cfg.team_names.name(Team::A), "Home");
        assert_eq!(cfg.roster.len(), 2);
        assert_eq!(cfg.set_config(3).map(|s| s.starting_server), Some(Team::B));
        assert_eq!(cfg.rotation_policy, RotationPolicy::EverySideOut);
    }

    #[test]
    fn rejects_set_zero_and_duplicate_roster_names() {
        assert!(matches!(
            MatchConfig::from_json_str(r#"{"current_set": 0}"#),
            Err(ConfigError::ZeroSet)
        ));
        assert!(MatchConfig::from_json_str(r#"{"roster": [{"name": "A", "number": null}, {"name": "A", "number": 2}]}"#).is_err());
    }
}
