//! Journal ops: the unit of undo, redo and persistence.

use serde::{Deserialize, Serialize};

use crate::{
    event::EventRecord,
    types::{EventSeq, OpSeq},
};

/// Current [`StoredOpEnvelope`] layout.
pub const OP_FORMAT_VERSION: u16 = 1;

/// One ledger mutation. Each variant is the inverse of the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Append a fully materialized event.
    Append {
        /// Appended event.
        event: EventRecord,
    },
    /// Remove an event. Carries the removed record so the op can be inverted.
    Remove {
        /// Removed event.
        event: EventRecord,
    },
}

impl Op {
    /// Event the op touches.
    pub fn event(&self) -> &EventRecord {
        match self {
            Op::Append { event } | Op::Remove { event } => event,
        }
    }

    /// Sequence of the touched event.
    pub fn event_seq(&self) -> EventSeq {
        self.event().seq
    }
}

/// An op stamped with its journal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Journal position, strictly increasing.
    pub seq: OpSeq,
    /// Wall clock at stamping, unix millis.
    pub ts_ms: u64,
    /// The mutation.
    pub op: Op,
}

/// On-disk form of a [`StoredOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOpEnvelope {
    /// Layout version; readers reject unknown ones.
    pub format_version: u16,
    /// Journaled op.
    pub stored: StoredOp,
}

impl StoredOpEnvelope {
    /// Wraps `stored` at the current layout.
    pub fn new(stored: StoredOp) -> Self {
        Self {
            format_version: OP_FORMAT_VERSION,
            stored,
        }
    }
}
