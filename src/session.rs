//! Match session: the ledger, its configuration, and the live projection.
//!
//! Every mutation goes through the ledger and is immediately reconciled into
//! the projection. Checks that can fail (event shape, unknown player,
//! incomplete lineup) run before the ledger is touched, so a failed call
//! leaves both ledger and derived state exactly as they were.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    action::Action,
    config::{ConfigError, MatchConfig},
    core::ledger::{EventLedger, LedgerError},
    engine::{
        EngineError,
        projector::{Projector, Step},
        score::{Score, set_scores},
        volley::{RallyOutcome, RallyState, VolleyEngine},
    },
    event::{EventDraft, EventRecord, InvalidEvent, RotationSnapshot},
    op::{Op, StoredOp},
    state::{MatchState, derive_match_state},
    stats::{EventRow, StatsTable, event_rows, player_stats},
    types::{EventSeq, PlayerId, SetNumber, Team},
};

/// Errors from session mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Ledger rejected the mutation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The affected set cannot be evaluated.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<InvalidEvent> for SessionError {
    fn from(value: InvalidEvent) -> Self {
        Self::Ledger(LedgerError::InvalidEvent(value))
    }
}

/// Ledger plus configuration plus live projection for one match.
pub struct MatchSession {
    config: MatchConfig,
    ledger: EventLedger,
    projector: Projector<VolleyEngine>,
}

impl MatchSession {
    /// Session over an empty ledger.
    pub fn new(config: MatchConfig) -> Self {
        Self::with_ledger(config, EventLedger::new())
    }

    /// Session over a recovered ledger; sets are projected lazily.
    pub fn with_ledger(config: MatchConfig, ledger: EventLedger) -> Self {
        let projector = Projector::new(VolleyEngine::new(config.clone()));
        Self {
            config,
            ledger,
            projector,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Underlying ledger.
    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    /// Set new events go into.
    pub fn current_set(&self) -> SetNumber {
        self.config.current_set
    }

    /// Records one event. The snapshot is filled from the current state
    /// when the draft leaves it empty.
    pub fn record(&mut self, mut draft: EventDraft) -> Result<EventSeq, SessionError> {
        draft.validate()?;
        if let Some(name) = draft.subject.player() {
            if !self.config.roster.contains(name) {
                return Err(InvalidEvent::UnknownPlayer(name.to_string()).into());
            }
        }

        let set = draft.set_number;
        self.projector.ensure_set(&self.ledger, set)?;
        if draft.snapshot == RotationSnapshot::default() {
            if let Some(state) = self.projector.state(set) {
                draft.snapshot = RotationSnapshot {
                    serving_team: Some(state.serving_team),
                    setter_slot: state.lineup.setter_slot(&self.config.roster),
                };
            }
        }

        let (seq, stored) = self.ledger.append(draft)?;
        self.projector.apply_stored_op(&self.ledger, &stored)?;
        debug!(seq, set, "event recorded");
        Ok(seq)
    }

    /// Records a scouted-team fundamental in the current set.
    pub fn record_action(&mut self, player: impl Into<PlayerId>, action: Action) -> Result<EventSeq, SessionError> {
        self.record(EventDraft::player(self.config.current_set, Team::A, player, action))
    }

    /// Records a generic event in the current set.
    pub fn record_generic(&mut self, action: Action) -> Result<EventSeq, SessionError> {
        self.record(EventDraft::generic(self.config.current_set, action))
    }

    /// Deletes an event and re-derives score, service and lineup of its set.
    pub fn remove(&mut self, seq: EventSeq) -> Result<EventRecord, SessionError> {
        let set = self
            .ledger
            .get(seq)
            .ok_or(LedgerError::EventNotFound(seq))?
            .set_number;
        self.projector.ensure_set(&self.ledger, set)?;
        let (event, stored) = self.ledger.remove(seq)?;
        self.projector.apply_stored_op(&self.ledger, &stored)?;
        debug!(seq, set, "event removed");
        Ok(event)
    }

    /// Undoes the last ledger mutation.
    pub fn undo(&mut self) -> Result<StoredOp, SessionError> {
        let set = self.ledger.peek_undo().map(op_set).ok_or(LedgerError::NothingToUndo)?;
        self.projector.ensure_set(&self.ledger, set)?;
        let stored = self.ledger.undo()?;
        self.projector.apply_stored_op(&self.ledger, &stored)?;
        Ok(stored)
    }

    /// Redoes the last undone mutation.
    pub fn redo(&mut self) -> Result<StoredOp, SessionError> {
        let set = self.ledger.peek_redo().map(op_set).ok_or(LedgerError::NothingToRedo)?;
        self.projector.ensure_set(&self.ledger, set)?;
        let stored = self.ledger.redo()?;
        self.projector.apply_stored_op(&self.ledger, &stored)?;
        Ok(stored)
    }

    /// Snapshot of the current set.
    pub fn state(&self) -> Result<MatchState, EngineError> {
        self.state_for_set(self.config.current_set)
    }

    /// Snapshot of `set`.
    pub fn state_for_set(&self, set: SetNumber) -> Result<MatchState, EngineError> {
        let count = self.ledger.events_for_set(set).len();
        match self.projector.state(set) {
            Some(state) => Ok(MatchState::assemble(&self.config, set, state, count)),
            None => {
                let mut config = self.config.clone();
                config.current_set = set;
                derive_match_state(&self.ledger, &config)
            }
        }
    }

    /// Per-event outcomes of a projected set, oldest first.
    pub fn outcomes(&self, set: SetNumber) -> &[Step<RallyState, RallyOutcome>] {
        self.projector.steps(set)
    }

    /// Score of every set with events.
    pub fn set_scores(&self) -> BTreeMap<SetNumber, Score> {
        set_scores(&self.ledger)
    }

    /// Statistics over one set or the whole match.
    pub fn stats(&self, set: Option<SetNumber>) -> StatsTable {
        player_stats(&self.ledger, &self.config, set)
    }

    /// Flat export rows for every event.
    pub fn event_rows(&self) -> Vec<EventRow> {
        event_rows(&self.ledger, &self.config)
    }

    /// Moves recording to another set.
    pub fn set_current_set(&mut self, set: SetNumber) -> Result<(), ConfigError> {
        if set == 0 {
            return Err(ConfigError::ZeroSet);
        }
        self.config.current_set = set;
        info!(set, "current set changed");
        Ok(())
    }

    /// Replaces the configuration; every set is re-derived on next use.
    pub fn reconfigure(&mut self, config: MatchConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.projector = Projector::new(VolleyEngine::new(config.clone()));
        self.config = config;
        info!(set = self.config.current_set, "session reconfigured");
        Ok(())
    }

    /// Takes ops not yet persisted.
    pub fn drain_pending_ops(&mut self) -> Vec<StoredOp> {
        self.ledger.drain_pending_ops()
    }

    /// Highest op sequence assigned.
    pub fn latest_op_seq(&self) -> crate::types::OpSeq {
        self.ledger.latest_op_seq()
    }
}

fn op_set(op: &Op) -> SetNumber {
    op.event().set_number
}
