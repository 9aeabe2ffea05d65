//! Rally event records, drafts, and the snapshot stored alongside each one.

use serde::{Deserialize, Serialize};

use crate::{
    action::Action,
    types::{EventSeq, PlayerId, SetNumber, Slot, Team},
};

/// Who performed the action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// A named roster player.
    Player(PlayerId),
    /// Team-level event with no individual attribution.
    Generic,
}

impl Subject {
    /// Player name when the subject is a player.
    pub fn player(&self) -> Option<&str> {
        match self {
            Subject::Player(name) => Some(name),
            Subject::Generic => None,
        }
    }
}

/// Service and rotation context captured when the event was recorded.
///
/// Kept for audit and export only; derivation never reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationSnapshot {
    /// Team serving at record time.
    pub serving_team: Option<Team>,
    /// Slot occupied by the setter at record time.
    pub setter_slot: Option<Slot>,
}

/// Fully materialized, immutable ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Ledger-unique, strictly increasing sequence.
    pub seq: EventSeq,
    /// Set the rally belongs to.
    pub set_number: SetNumber,
    /// Team the action is attributed to.
    pub team: Team,
    /// Acting player or generic marker.
    pub subject: Subject,
    /// Action and outcome.
    pub action: Action,
    /// Context at record time.
    pub snapshot: RotationSnapshot,
    /// Optional operator note.
    pub note: Option<String>,
    /// Wall-clock timestamp in milliseconds since epoch.
    pub ts_ms: u64,
}

/// Insert payload used to create a new [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Set the rally belongs to.
    pub set_number: SetNumber,
    /// Team the action is attributed to.
    pub team: Team,
    /// Acting player or generic marker.
    pub subject: Subject,
    /// Action and outcome.
    pub action: Action,
    /// Context at record time; filled by the session when left default.
    pub snapshot: RotationSnapshot,
    /// Optional operator note.
    pub note: Option<String>,
}

impl EventDraft {
    /// Player-scoped fundamental.
    pub fn player(set_number: SetNumber, team: Team, player: impl Into<PlayerId>, action: Action) -> Self {
        Self {
            set_number,
            team,
            subject: Subject::Player(player.into()),
            action,
            snapshot: RotationSnapshot::default(),
            note: None,
        }
    }

    /// Generic event; the team follows from the kind.
    pub fn generic(set_number: SetNumber, action: Action) -> Self {
        Self {
            set_number,
            team: action.kind().generic_team().unwrap_or(Team::A),
            subject: Subject::Generic,
            action,
            snapshot: RotationSnapshot::default(),
            note: None,
        }
    }

    /// Attaches an operator note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Checks the draft against the event shape rules.
    pub fn validate(&self) -> Result<(), InvalidEvent> {
        if self.set_number == 0 {
            return Err(InvalidEvent::ZeroSet);
        }
        let kind = self.action.kind();
        match (&self.subject, kind.generic_team()) {
            (Subject::Generic, None) => Err(InvalidEvent::MissingSubject(kind)),
            (Subject::Player(_), Some(_)) => Err(InvalidEvent::UnexpectedSubject(kind)),
            (Subject::Player(name), None) if name.trim().is_empty() => Err(InvalidEvent::MissingSubject(kind)),
            (Subject::Generic, Some(team)) if team != self.team => Err(InvalidEvent::GenericTeamMismatch {
                kind,
                expected: team,
                got: self.team,
            }),
            _ => Ok(()),
        }
    }
}

/// Reasons a draft is rejected before append.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEvent {
    /// Set number zero.
    #[error("set number must be positive")]
    ZeroSet,
    /// Fundamental without a player.
    #[error("{0} requires a subject player")]
    MissingSubject(crate::action::ActionKind),
    /// Generic event with a player.
    #[error("{0} is a generic event and takes no subject player")]
    UnexpectedSubject(crate::action::ActionKind),
    /// Generic event attributed to the wrong team.
    #[error("{kind} is attributed to team {expected}, got team {got}")]
    GenericTeamMismatch {
        /// Generic kind.
        kind: crate::action::ActionKind,
        /// Team the kind implies.
        expected: Team,
        /// Team on the draft.
        got: Team,
    },
    /// Result code outside the kind's vocabulary.
    #[error(transparent)]
    ResultCode(#[from] crate::action::InvalidResultCode),
    /// Player not in the roster.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),
}
