//! Libero substitution rule for the scouted team.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    roster::Roster,
    types::{PlayerId, Slot, Team},
};

use super::lineup::Lineup;

/// Back-row slots scanned for a middle while receiving, in priority order.
const RECEIVING_SCAN: [u8; 2] = [5, 6];

/// One libero swap performed by the rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiberoSwap {
    /// The libero entered a back-row slot.
    In {
        /// Slot taken.
        slot: Slot,
        /// Middle sent off.
        replaced: PlayerId,
    },
    /// The libero left the court.
    Out {
        /// Slot vacated.
        slot: Slot,
        /// Middle brought back.
        restored: PlayerId,
    },
}

/// The libero had to leave but no middle was available to come back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("roster inconsistency: no middle off court to replace libero {libero} in slot {slot}")]
pub struct RosterInconsistency {
    /// Designated libero.
    pub libero: PlayerId,
    /// Slot the libero occupies.
    pub slot: Slot,
}

/// What one evaluation of the libero rule did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiberoOutcome {
    /// Swaps performed, in order.
    pub swaps: Vec<LiberoSwap>,
    /// Set when the libero had to leave but no middle could return.
    pub inconsistency: Option<RosterInconsistency>,
}

/// Evaluates the rule against current occupants for the given serving team.
///
/// Receiving: the first middle found in slot 5 then 6 goes off for the
/// libero. Serving: a libero in the server slot goes off for a middle not on
/// court. A libero carried into the front row always goes off. The rule
/// never swaps the libero in while it is already on court, so re-applying it
/// without a rotation in between changes nothing.
pub fn apply_libero_rule(lineup: &mut Lineup, roster: &Roster, serving: Team) -> LiberoOutcome {
    let mut outcome = LiberoOutcome::default();
    let Some(libero) = lineup.libero().map(str::to_string) else {
        return outcome;
    };

    if let Some(slot) = lineup.libero_slot() {
        let must_leave = slot.is_front_row() || (serving == Team::A && slot == Slot::SERVER);
        if !must_leave {
            return outcome;
        }
        match returning_middle(lineup, roster, &libero) {
            Some(restored) => {
                debug!(%slot, %restored, "libero out");
                lineup.swap_out_libero(slot, restored.clone());
                outcome.swaps.push(LiberoSwap::Out { slot, restored });
            }
            None => {
                let inconsistency = RosterInconsistency { libero, slot };
                warn!(%inconsistency, "libero left in place");
                outcome.inconsistency = Some(inconsistency);
                return outcome;
            }
        }
    }

    if serving == Team::A {
        return outcome;
    }

    let target = RECEIVING_SCAN
        .into_iter()
        .filter_map(Slot::new)
        .find(|slot| roster.is_middle(lineup.occupant(*slot)));
    if let Some(slot) = target {
        if let Some(replaced) = lineup.swap_in_libero(slot) {
            debug!(%slot, %replaced, "libero in");
            outcome.swaps.push(LiberoSwap::In { slot, replaced });
        }
    }

    outcome
}

/// Middle due back on court: the one the libero replaced, else the first
/// roster middle that is neither on court nor the libero.
fn returning_middle(lineup: &Lineup, roster: &Roster, libero: &str) -> Option<PlayerId> {
    if let Some(replaced) = lineup
        .replaced_by_libero()
        .filter(|name| roster.is_middle(name) && !lineup.on_court(name))
    {
        return Some(replaced.to_string());
    }
    roster
        .with_role(crate::roster::Role::Middle)
        .map(|p| p.name.as_str())
        .find(|name| *name != libero && !lineup.on_court(name))
        .map(str::to_string)
}
