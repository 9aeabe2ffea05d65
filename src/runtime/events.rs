//! Runtime event stream payloads.

use crate::{
    state::MatchState,
    types::{EventSeq, OpSeq},
};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoutEvent {
    /// A rally event was recorded.
    Recorded {
        /// Ledger sequence of the new event.
        seq: EventSeq,
    },
    /// A rally event was deleted.
    Removed {
        /// Ledger sequence of the deleted event.
        seq: EventSeq,
    },
    /// One undo step was applied.
    UndoApplied,
    /// One redo step was applied.
    RedoApplied,
    /// Configuration was replaced.
    Reconfigured,
    /// Derived state of the current set after a mutation.
    StateChanged(Box<MatchState>),
    /// Persistence has reached at least this op sequence.
    DurableUpTo {
        /// Highest sequence known durable.
        op_seq: OpSeq,
    },
}
