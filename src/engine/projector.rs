use hashbrown::HashMap;

use crate::{
    core::ledger::EventLedger,
    event::EventRecord,
    op::{Op, StoredOp},
    types::{EventSeq, SetNumber},
};

use super::traits::RallyEngine;

/// Engine state right after one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S, V> {
    /// Event folded in this step.
    pub seq: EventSeq,
    /// Engine evaluation of the event.
    pub eval: V,
    /// State after the event.
    pub state: S,
}

struct Timeline<S, V> {
    initial: S,
    steps: Vec<Step<S, V>>,
}

impl<S, V> Timeline<S, V> {
    fn state_before(&self, pos: usize) -> &S {
        match pos.checked_sub(1).and_then(|i| self.steps.get(i)) {
            Some(step) => &step.state,
            None => &self.initial,
        }
    }

    fn current(&self) -> &S {
        self.state_before(self.steps.len())
    }
}

/// Keeps per-set engine state in step with the ledger.
///
/// Appends at the tail fold one event onto the last state. Anything else
/// (removal, undo restoring an older event) replays the set from the first
/// affected position, so the result always equals a full replay.
pub struct Projector<E: RallyEngine> {
    engine: E,
    timelines: HashMap<SetNumber, Timeline<E::State, E::Eval>>,
}

impl<E: RallyEngine> Projector<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            timelines: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self, set: SetNumber) -> Option<&E::State> {
        self.timelines.get(&set).map(Timeline::current)
    }

    pub fn steps(&self, set: SetNumber) -> &[Step<E::State, E::Eval>] {
        self.timelines.get(&set).map(|t| t.steps.as_slice()).unwrap_or(&[])
    }

    pub fn is_tracked(&self, set: SetNumber) -> bool {
        self.timelines.contains_key(&set)
    }

    /// Builds the timeline of `set` from the ledger unless already tracked.
    pub fn ensure_set(&mut self, ledger: &EventLedger, set: SetNumber) -> Result<(), E::Error> {
        if self.is_tracked(set) {
            return Ok(());
        }
        self.rebuild_set(ledger, set)
    }

    /// Discards and fully replays `set`.
    pub fn rebuild_set(&mut self, ledger: &EventLedger, set: SetNumber) -> Result<(), E::Error> {
        let initial = self.engine.initial_state(set)?;
        let steps = fold_steps(&self.engine, &initial, ledger.events_for_set(set));
        self.timelines.insert(set, Timeline { initial, steps });
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.timelines.clear();
    }

    /// Reconciles the projection with one ledger op already applied to `ledger`.
    pub fn apply_stored_op(&mut self, ledger: &EventLedger, stored: &StoredOp) -> Result<(), E::Error> {
        let event = stored.op.event();
        let set = event.set_number;
        if !self.is_tracked(set) {
            return self.rebuild_set(ledger, set);
        }

        let Some(timeline) = self.timelines.get_mut(&set) else {
            return Ok(());
        };
        let at_tail = timeline.steps.last().is_none_or(|last| last.seq < event.seq);

        match &stored.op {
            Op::Append { event } if at_tail => {
                let mut state = timeline.current().clone();
                let eval = self.engine.apply(&mut state, event);
                timeline.steps.push(Step {
                    seq: event.seq,
                    eval,
                    state,
                });
            }
            _ => {
                let pos = timeline.steps.partition_point(|s| s.seq < event.seq);
                let base = timeline.state_before(pos).clone();
                let tail = ledger
                    .events_for_set(set)
                    .into_iter()
                    .filter(|e| e.seq >= event.seq);
                let replayed = fold_steps(&self.engine, &base, tail);
                timeline.steps.truncate(pos);
                timeline.steps.extend(replayed);
            }
        }
        Ok(())
    }
}

fn fold_steps<'a, E: RallyEngine>(
    engine: &E,
    initial: &E::State,
    events: impl IntoIterator<Item = &'a EventRecord>,
) -> Vec<Step<E::State, E::Eval>> {
    let mut state = initial.clone();
    events
        .into_iter()
        .map(|event| {
            let eval = engine.apply(&mut state, event);
            Step {
                seq: event.seq,
                eval,
                state: state.clone(),
            }
        })
        .collect()
}
