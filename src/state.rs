//! Externally observable match snapshot and the one derivation function.

use serde::{Deserialize, Serialize};

use crate::{
    config::MatchConfig,
    core::ledger::EventLedger,
    engine::{
        EngineError,
        lineup::Lineup,
        score::Score,
        traits::replay,
        volley::{RallyState, VolleyEngine},
    },
    types::{SetNumber, Slot, Team},
};

/// Read-only view handed to rendering and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Set this state describes.
    pub current_set: SetNumber,
    /// Score of the set.
    pub score: Score,
    /// Team serving the next rally.
    pub serving_team: Team,
    /// Scouted lineup with the libero applied.
    pub lineup: Lineup,
    /// Setter's slot, shown as `P1`..`P6`.
    pub setter_slot: Option<Slot>,
    /// Live events recorded in the set.
    pub events_in_set: usize,
}

impl MatchState {
    pub(crate) fn assemble(config: &MatchConfig, set: SetNumber, state: &RallyState, events_in_set: usize) -> Self {
        Self {
            current_set: set,
            score: state.score,
            serving_team: state.serving_team,
            lineup: state.lineup.clone(),
            setter_slot: state.lineup.setter_slot(&config.roster),
            events_in_set,
        }
    }

    /// `P<n>` label of the setter's slot, or `-` when no setter is on court.
    pub fn rotation_label(&self) -> String {
        rotation_label(self.setter_slot)
    }
}

/// `P<n>` for a setter slot, `-` for none.
pub fn rotation_label(slot: Option<Slot>) -> String {
    slot.map(|s| format!("P{s}")).unwrap_or_else(|| "-".to_string())
}

/// Full replay of the active set from configuration and ledger.
pub fn derive_match_state(ledger: &EventLedger, config: &MatchConfig) -> Result<MatchState, EngineError> {
    let set = config.current_set;
    let engine = VolleyEngine::new(config.clone());
    let events = ledger.events_for_set(set);
    let count = events.len();
    let state = replay(&engine, set, events)?;
    Ok(MatchState::assemble(config, set, &state, count))
}
