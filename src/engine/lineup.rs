//! Six-slot rotational lineup for the scouted team plus the libero pointer.

use serde::{Deserialize, Serialize};

use crate::{
    roster::Roster,
    types::{PlayerId, Slot},
};

use super::EngineError;

/// Operator-entered lineup; slots may still be blank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineupDraft {
    /// Occupants of slots 1..=6, index 0 being slot 1.
    #[serde(default)]
    pub slots: [Option<PlayerId>; 6],
    /// Designated libero.
    #[serde(default)]
    pub libero: Option<PlayerId>,
}

impl LineupDraft {
    /// Complete draft from six names in slot order.
    pub fn new<S: Into<PlayerId>>(slots: [S; 6], libero: Option<S>) -> Self {
        Self {
            slots: slots.map(|s| Some(s.into())),
            libero: libero.map(Into::into),
        }
    }

    /// Assigns or clears one slot.
    pub fn set(&mut self, slot: Slot, player: Option<PlayerId>) {
        self.slots[slot.index()] = player;
    }

    /// Slots that add no distinct player: blank, or repeating a name
    /// already placed in a lower slot.
    pub fn missing_slots(&self) -> Vec<Slot> {
        let names: Vec<Option<&str>> = self
            .slots
            .iter()
            .map(|s| s.as_deref().map(str::trim).filter(|name| !name.is_empty()))
            .collect();
        Slot::ALL
            .into_iter()
            .filter(|slot| {
                let i = slot.index();
                names[i].is_none_or(|name| names[..i].contains(&Some(name)))
            })
            .collect()
    }
}

/// Validated lineup: six distinct occupants, libero distinct from all of them
/// while off court.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lineup {
    slots: [PlayerId; 6],
    libero: Option<PlayerId>,
    /// Player the libero is currently standing in for.
    replaced: Option<PlayerId>,
}

impl Lineup {
    /// Validates a draft against the roster.
    pub fn from_draft(draft: &LineupDraft, roster: &Roster) -> Result<Self, EngineError> {
        let missing = draft.missing_slots();
        if !missing.is_empty() {
            return Err(EngineError::IncompleteLineup { missing });
        }

        let slots: [PlayerId; 6] = draft
            .slots
            .clone()
            .map(|s| s.map(|name| name.trim().to_string()).unwrap_or_default());
        let libero = draft
            .libero
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if let Some(name) = libero.as_ref().filter(|name| slots.contains(name)) {
            return Err(EngineError::DuplicatePlayer(name.clone()));
        }
        if let Some(name) = slots.iter().chain(libero.iter()).find(|name| !roster.contains(name)) {
            return Err(EngineError::UnknownPlayer(name.clone()));
        }

        Ok(Self {
            slots,
            libero,
            replaced: None,
        })
    }

    /// Player currently in `slot`.
    pub fn occupant(&self, slot: Slot) -> &str {
        &self.slots[slot.index()]
    }

    /// Occupants in slot order 1..=6.
    pub fn slots(&self) -> &[PlayerId; 6] {
        &self.slots
    }

    /// Designated libero, if any.
    pub fn libero(&self) -> Option<&str> {
        self.libero.as_deref()
    }

    /// Player currently replaced by the libero, if the libero is on court.
    pub fn replaced_by_libero(&self) -> Option<&str> {
        self.replaced.as_deref()
    }

    /// Slot held by `name`.
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| self.occupant(*slot) == name)
    }

    /// True if `name` occupies a slot.
    pub fn on_court(&self, name: &str) -> bool {
        self.slot_of(name).is_some()
    }

    /// Slot the libero occupies, if on court.
    pub fn libero_slot(&self) -> Option<Slot> {
        self.libero().and_then(|l| self.slot_of(l))
    }

    /// One clockwise step: slot 2 to 1, 3 to 2, ..., 1 to 6.
    pub fn rotate(&mut self) {
        self.slots.rotate_left(1);
    }

    /// Puts the libero into `slot`, remembering who left.
    pub(crate) fn swap_in_libero(&mut self, slot: Slot) -> Option<PlayerId> {
        let libero = self.libero.clone()?;
        let out = std::mem::replace(&mut self.slots[slot.index()], libero);
        self.replaced = Some(out.clone());
        Some(out)
    }

    /// Takes the libero out of `slot`, bringing `player` back in.
    pub(crate) fn swap_out_libero(&mut self, slot: Slot, player: PlayerId) {
        self.slots[slot.index()] = player;
        self.replaced = None;
    }

    /// Setter's slot, the basis of the `P1`..`P6` rotation label.
    pub fn setter_slot(&self, roster: &Roster) -> Option<Slot> {
        roster
            .with_role(crate::roster::Role::Setter)
            .find_map(|p| self.slot_of(&p.name))
    }
}
