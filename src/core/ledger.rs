use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    event::{EventDraft, EventRecord, InvalidEvent},
    op::{Op, StoredOp},
    types::{EventSeq, OpSeq, PlayerId, SetNumber},
};

use super::indices::{VecIndex, insert_sorted, remove_sorted};

/// Ledger mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] InvalidEvent),
    #[error("event not found: {0}")]
    EventNotFound(EventSeq),
    #[error("event already exists: {0}")]
    AlreadyExists(EventSeq),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Serializable ledger snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshotV1 {
    /// Next event sequence to assign.
    pub next_event_seq: EventSeq,
    /// Next op sequence to assign.
    pub next_op_seq: OpSeq,
    /// Live events in sequence order.
    pub events: Vec<EventRecord>,
}

/// Append-only rally log. The only mutations are append and removal by
/// sequence; both are journaled as [`StoredOp`]s and can be undone.
#[derive(Debug, Default)]
pub struct EventLedger {
    events: HashMap<EventSeq, EventRecord>,
    order: Vec<EventSeq>,
    by_set: VecIndex<SetNumber>,
    by_player: VecIndex<PlayerId>,
    undo: Vec<Op>,
    redo: Vec<Op>,
    pending_ops: Vec<StoredOp>,
    next_op_seq: OpSeq,
    next_event_seq: EventSeq,
}

impl EventLedger {
    pub fn new() -> Self {
        Self {
            next_op_seq: 1,
            next_event_seq: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a ledger and its indices from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshotV1) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            next_event_seq: snapshot.next_event_seq,
            next_op_seq: snapshot.next_op_seq,
            ..Self::default()
        };

        for event in snapshot.events {
            if ledger.events.contains_key(&event.seq) {
                return Err(LedgerError::AlreadyExists(event.seq));
            }
            ledger.insert_indices(&event);
            ledger.events.insert(event.seq, event);
        }

        Ok(ledger)
    }

    /// Exports live events and counters.
    pub fn export_snapshot(&self) -> LedgerSnapshotV1 {
        LedgerSnapshotV1 {
            next_event_seq: self.next_event_seq,
            next_op_seq: self.next_op_seq,
            events: self.iter().cloned().collect(),
        }
    }

    /// Validates and appends a new event, returning its sequence.
    pub fn append(&mut self, draft: EventDraft) -> Result<(EventSeq, StoredOp), LedgerError> {
        draft.validate()?;

        let seq = self.next_event_seq;
        let event = EventRecord {
            seq,
            set_number: draft.set_number,
            team: draft.team,
            subject: draft.subject,
            action: draft.action,
            snapshot: draft.snapshot,
            note: draft.note,
            ts_ms: now_ms(),
        };

        let stored = self.journal(Op::Append { event }, Origin::Fresh)?;
        Ok((seq, stored))
    }

    /// Removes the event with sequence `seq`.
    pub fn remove(&mut self, seq: EventSeq) -> Result<(EventRecord, StoredOp), LedgerError> {
        let event = self.events.get(&seq).cloned().ok_or(LedgerError::EventNotFound(seq))?;
        let stored = self.journal(Op::Remove { event }, Origin::Fresh)?;
        Ok((stored.op.event().clone(), stored))
    }

    /// Reverts the most recent append or removal.
    pub fn undo(&mut self) -> Result<StoredOp, LedgerError> {
        let op = self.undo.pop().ok_or(LedgerError::NothingToUndo)?;
        self.journal(op, Origin::Undo)
    }

    /// Re-applies the most recently undone op.
    pub fn redo(&mut self) -> Result<StoredOp, LedgerError> {
        let op = self.redo.pop().ok_or(LedgerError::NothingToRedo)?;
        self.journal(op, Origin::Redo)
    }

    /// Re-applies a journaled op during recovery, keeping its op sequence.
    /// Recovered history cannot be undone.
    pub fn apply_replayed_op(&mut self, stored: StoredOp) -> Result<(), LedgerError> {
        self.commit(stored.op, stored.seq)?;
        self.undo.clear();
        self.redo.clear();
        Ok(())
    }

    pub fn get(&self, seq: EventSeq) -> Option<&EventRecord> {
        self.events.get(&seq)
    }

    pub fn contains(&self, seq: EventSeq) -> bool {
        self.events.contains_key(&seq)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.order.iter().filter_map(|seq| self.events.get(seq))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Events of one set, in sequence order.
    pub fn events_for_set(&self, set: SetNumber) -> Vec<&EventRecord> {
        self.lookup(self.by_set.get(&set))
    }

    pub fn events_for_set_cloned(&self, set: SetNumber) -> Vec<EventRecord> {
        self.events_for_set(set).into_iter().cloned().collect()
    }

    /// Events of one player across sets, oldest first.
    pub fn by_player(&self, name: &str) -> Vec<&EventRecord> {
        self.lookup(self.by_player.get(name))
    }

    /// Last `n` events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&EventRecord> {
        let start = self.order.len().saturating_sub(n);
        self.order[start..]
            .iter()
            .filter_map(|seq| self.events.get(seq))
            .collect()
    }

    pub fn recent_cloned(&self, n: usize) -> Vec<EventRecord> {
        self.recent(n).into_iter().cloned().collect()
    }

    /// Set numbers with at least one event, ascending.
    pub fn set_numbers(&self) -> Vec<SetNumber> {
        let mut sets: Vec<SetNumber> = self
            .by_set
            .iter()
            .filter(|(_, seqs)| !seqs.is_empty())
            .map(|(set, _)| *set)
            .collect();
        sets.sort_unstable();
        sets
    }

    pub fn ordered_seqs(&self) -> &[EventSeq] {
        &self.order
    }

    /// Takes ops not yet handed to persistence.
    pub fn drain_pending_ops(&mut self) -> Vec<StoredOp> {
        std::mem::take(&mut self.pending_ops)
    }

    /// Op that the next [`Self::undo`] would apply.
    pub fn peek_undo(&self) -> Option<&Op> {
        self.undo.last()
    }

    pub fn peek_redo(&self) -> Option<&Op> {
        self.redo.last()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Highest op sequence assigned so far.
    pub fn latest_op_seq(&self) -> OpSeq {
        self.next_op_seq.saturating_sub(1)
    }

    fn lookup(&self, seqs: Option<&Vec<EventSeq>>) -> Vec<&EventRecord> {
        seqs.into_iter()
            .flat_map(|seqs| seqs.iter())
            .filter_map(|seq| self.events.get(seq))
            .collect()
    }

    /// Commits `op` at the next op sequence and files its inverse.
    fn journal(&mut self, op: Op, origin: Origin) -> Result<StoredOp, LedgerError> {
        let op_seq = self.next_op_seq;
        let (stored, inverse) = self.commit(op, op_seq)?;
        match origin {
            Origin::Fresh => {
                self.redo.clear();
                self.undo.push(inverse);
            }
            Origin::Undo => self.redo.push(inverse),
            Origin::Redo => self.undo.push(inverse),
        }
        self.pending_ops.push(stored.clone());
        Ok(stored)
    }

    /// Applies `op` to events and indices, returning it stamped at `op_seq`
    /// together with its inverse.
    fn commit(&mut self, op: Op, op_seq: OpSeq) -> Result<(StoredOp, Op), LedgerError> {
        let (applied, inverse) = match op {
            Op::Append { event } => {
                if self.events.contains_key(&event.seq) {
                    return Err(LedgerError::AlreadyExists(event.seq));
                }
                self.next_event_seq = self.next_event_seq.max(event.seq.saturating_add(1));
                self.insert_indices(&event);
                self.events.insert(event.seq, event.clone());
                (Op::Append { event: event.clone() }, Op::Remove { event })
            }
            Op::Remove { event } => {
                let live = self
                    .events
                    .remove(&event.seq)
                    .ok_or(LedgerError::EventNotFound(event.seq))?;
                self.remove_indices(&live);
                (Op::Remove { event: live.clone() }, Op::Append { event: live })
            }
        };

        self.next_op_seq = self.next_op_seq.max(op_seq.saturating_add(1));
        let stored = StoredOp {
            seq: op_seq,
            ts_ms: now_ms(),
            op: applied,
        };
        Ok((stored, inverse))
    }

    fn insert_indices(&mut self, event: &EventRecord) {
        insert_sorted(&mut self.order, event.seq);
        insert_sorted(self.by_set.entry(event.set_number).or_default(), event.seq);
        if let Some(name) = event.subject.player() {
            insert_sorted(self.by_player.entry(name.to_string()).or_default(), event.seq);
        }
    }

    fn remove_indices(&mut self, event: &EventRecord) {
        remove_sorted(&mut self.order, event.seq);
        if let Some(seqs) = self.by_set.get_mut(&event.set_number) {
            remove_sorted(seqs, event.seq);
        }
        if let Some(seqs) = event.subject.player().and_then(|name| self.by_player.get_mut(name)) {
            remove_sorted(seqs, event.seq);
        }
    }
}

/// Where a journaled op came from; decides which stack gets its inverse.
enum Origin {
    Fresh,
    Undo,
    Redo,
}

pub(crate) fn now_ms() -> u64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
