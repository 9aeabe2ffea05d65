//! Derivation engines: score, service and rotation, libero rule, projector.

use crate::types::{PlayerId, SetNumber, Slot};

/// Libero substitution rule.
pub mod libero;
/// Validated lineup and rotation step.
pub mod lineup;
/// Incremental per-set projection of engine state.
#[allow(missing_docs)]
pub mod projector;
/// Service possession and side-out rotation.
pub mod rotation;
/// Score fold.
pub mod score;
/// Engine trait and full replay.
pub mod traits;
/// Volleyball rally engine combining score, rotation and libero rules.
pub mod volley;

/// Configuration problems that stop a set from being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Fewer than six distinct players are assigned.
    #[error("incomplete lineup, missing slots {missing:?}")]
    IncompleteLineup {
        /// Blank or repeated slots in ascending order.
        missing: Vec<Slot>,
    },
    /// The designated libero also holds a rotational slot.
    #[error("libero {0} is also assigned to a slot")]
    DuplicatePlayer(PlayerId),
    /// A lineup name is not in the roster.
    #[error("player {0} is not in the roster")]
    UnknownPlayer(PlayerId),
    /// Neither this set nor an earlier one is configured.
    #[error("no configuration for set {0}")]
    UnconfiguredSet(SetNumber),
}
