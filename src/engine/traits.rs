use crate::{event::EventRecord, types::SetNumber};

/// Deterministic per-set fold over rally events.
///
/// `initial_state` may fail on bad configuration; `apply` cannot fail.
pub trait RallyEngine: Send + Sync + 'static {
    /// State carried from one event to the next.
    type State: Clone + PartialEq + Send;
    /// Per-event evaluation.
    type Eval: Clone + PartialEq + Send;
    /// Reason a set cannot start.
    type Error;

    /// State before the first event of `set`.
    fn initial_state(&self, set: SetNumber) -> Result<Self::State, Self::Error>;
    /// Folds one event into `state`.
    fn apply(&self, state: &mut Self::State, event: &EventRecord) -> Self::Eval;
}

/// Replays `events` from the set's initial state.
pub fn replay<'a, E: RallyEngine>(
    engine: &E,
    set: SetNumber,
    events: impl IntoIterator<Item = &'a EventRecord>,
) -> Result<E::State, E::Error> {
    let mut state = engine.initial_state(set)?;
    for event in events {
        engine.apply(&mut state, event);
    }
    Ok(state)
}
