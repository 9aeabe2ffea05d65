//! Closed action vocabulary: fundamentals, generic events, and their outcomes.
//!
//! Each fundamental carries its own outcome enum, so an (action, result)
//! pair outside the fixed vocabulary cannot be constructed. Loose input
//! (journal payloads, UI codes) goes through [`Action::from_parts`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Team;

/// Action kind as tapped by the operator, without its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// Serve.
    Serve,
    /// Serve reception.
    Reception,
    /// Attack.
    Attack,
    /// Dig.
    Dig,
    /// Block.
    Block,
    /// Point scored by the opponent, no scouted player involved.
    OpponentPoint,
    /// Error committed by the opponent.
    OpponentError,
    /// Error charged to the scouted team as a whole.
    OwnTeamError,
}

impl ActionKind {
    /// Player-scoped fundamentals, in export column order.
    pub const FUNDAMENTALS: [ActionKind; 5] = [
        ActionKind::Serve,
        ActionKind::Reception,
        ActionKind::Attack,
        ActionKind::Dig,
        ActionKind::Block,
    ];

    /// Generic kinds that carry no subject player.
    pub const GENERIC: [ActionKind; 3] = [
        ActionKind::OpponentPoint,
        ActionKind::OpponentError,
        ActionKind::OwnTeamError,
    ];

    /// True for the generic kinds.
    pub fn is_generic(self) -> bool {
        Self::GENERIC.contains(&self)
    }

    /// Permitted result codes; empty for generic kinds.
    pub fn result_codes(self) -> &'static [ResultCode] {
        use ResultCode::*;
        match self {
            ActionKind::Serve => &[Point, Good, Regular, Error],
            ActionKind::Reception => &[Excellent, Good, Regular, Poor, Error],
            ActionKind::Attack => &[Point, Good, Regular, Blocked, Error],
            ActionKind::Dig => &[Excellent, Error],
            ActionKind::Block => &[Point, Error],
            ActionKind::OpponentPoint | ActionKind::OpponentError | ActionKind::OwnTeamError => &[],
        }
    }

    /// Team a generic event is attributed to.
    pub fn generic_team(self) -> Option<Team> {
        match self {
            ActionKind::OpponentError => Some(Team::A),
            ActionKind::OpponentPoint | ActionKind::OwnTeamError => Some(Team::B),
            _ => None,
        }
    }

    /// Short column prefix used by exports.
    pub fn code(self) -> &'static str {
        match self {
            ActionKind::Serve => "SRV",
            ActionKind::Reception => "REC",
            ActionKind::Attack => "ATK",
            ActionKind::Dig => "DIG",
            ActionKind::Block => "BLK",
            ActionKind::OpponentPoint => "OPP_PT",
            ActionKind::OpponentError => "OPP_ERR",
            ActionKind::OwnTeamError => "TEAM_ERR",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Every result code across the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultCode {
    /// Direct point for the acting team.
    Point,
    /// Excellent quality.
    Excellent,
    /// Good quality.
    Good,
    /// Playable, nothing special.
    Regular,
    /// Poor quality.
    Poor,
    /// Attack stuffed by the opposing block.
    Blocked,
    /// Error, point to the other team for terminal fundamentals.
    Error,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Serve outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServeResult {
    /// Ace.
    Point,
    /// Good.
    Good,
    /// Regular.
    Regular,
    /// Error.
    Error,
}

/// Reception outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceptionResult {
    /// Excellent.
    Excellent,
    /// Good.
    Good,
    /// Regular.
    Regular,
    /// Poor.
    Poor,
    /// Error.
    Error,
}

/// Attack outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackResult {
    /// Kill.
    Point,
    /// Good.
    Good,
    /// Regular.
    Regular,
    /// Blocked.
    Blocked,
    /// Error.
    Error,
}

/// Dig outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigResult {
    /// Excellent.
    Excellent,
    /// Error.
    Error,
}

/// Block outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockResult {
    /// Stuff block.
    Point,
    /// Error.
    Error,
}

/// A fully specified action: kind plus an outcome valid for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Serve.
    Serve(ServeResult),
    /// Reception.
    Reception(ReceptionResult),
    /// Attack.
    Attack(AttackResult),
    /// Dig.
    Dig(DigResult),
    /// Block.
    Block(BlockResult),
    /// Opponent point.
    OpponentPoint,
    /// Opponent error.
    OpponentError,
    /// Scouted team error.
    OwnTeamError,
}

/// Rejected (kind, code) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("result code {code:?} is not valid for {kind}")]
pub struct InvalidResultCode {
    /// Requested kind.
    pub kind: ActionKind,
    /// Offending code; `None` when a fundamental was given no code.
    pub code: Option<ResultCode>,
}

impl Action {
    /// Builds an action from loose parts, enforcing the vocabulary table.
    pub fn from_parts(kind: ActionKind, code: Option<ResultCode>) -> Result<Self, InvalidResultCode> {
        use ResultCode as C;
        let invalid = InvalidResultCode { kind, code };
        let action = match (kind, code) {
            (ActionKind::OpponentPoint, None) => Action::OpponentPoint,
            (ActionKind::OpponentError, None) => Action::OpponentError,
            (ActionKind::OwnTeamError, None) => Action::OwnTeamError,
            (_, None) => return Err(invalid),
            (ActionKind::Serve, Some(c)) => Action::Serve(match c {
                C::Point => ServeResult::Point,
                C::Good => ServeResult::Good,
                C::Regular => ServeResult::Regular,
                C::Error => ServeResult::Error,
                _ => return Err(invalid),
            }),
            (ActionKind::Reception, Some(c)) => Action::Reception(match c {
                C::Excellent => ReceptionResult::Excellent,
                C::Good => ReceptionResult::Good,
                C::Regular => ReceptionResult::Regular,
                C::Poor => ReceptionResult::Poor,
                C::Error => ReceptionResult::Error,
                _ => return Err(invalid),
            }),
            (ActionKind::Attack, Some(c)) => Action::Attack(match c {
                C::Point => AttackResult::Point,
                C::Good => AttackResult::Good,
                C::Regular => AttackResult::Regular,
                C::Blocked => AttackResult::Blocked,
                C::Error => AttackResult::Error,
                _ => return Err(invalid),
            }),
            (ActionKind::Dig, Some(c)) => Action::Dig(match c {
                C::Excellent => DigResult::Excellent,
                C::Error => DigResult::Error,
                _ => return Err(invalid),
            }),
            (ActionKind::Block, Some(c)) => Action::Block(match c {
                C::Point => BlockResult::Point,
                C::Error => BlockResult::Error,
                _ => return Err(invalid),
            }),
            (_, Some(_)) => return Err(invalid),
        };
        Ok(action)
    }

    /// Kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Serve(_) => ActionKind::Serve,
            Action::Reception(_) => ActionKind::Reception,
            Action::Attack(_) => ActionKind::Attack,
            Action::Dig(_) => ActionKind::Dig,
            Action::Block(_) => ActionKind::Block,
            Action::OpponentPoint => ActionKind::OpponentPoint,
            Action::OpponentError => ActionKind::OpponentError,
            Action::OwnTeamError => ActionKind::OwnTeamError,
        }
    }

    /// Result code, `None` for generic events.
    pub fn result_code(&self) -> Option<ResultCode> {
        use ResultCode as C;
        let code = match self {
            Action::Serve(r) => match r {
                ServeResult::Point => C::Point,
                ServeResult::Good => C::Good,
                ServeResult::Regular => C::Regular,
                ServeResult::Error => C::Error,
            },
            Action::Reception(r) => match r {
                ReceptionResult::Excellent => C::Excellent,
                ReceptionResult::Good => C::Good,
                ReceptionResult::Regular => C::Regular,
                ReceptionResult::Poor => C::Poor,
                ReceptionResult::Error => C::Error,
            },
            Action::Attack(r) => match r {
                AttackResult::Point => C::Point,
                AttackResult::Good => C::Good,
                AttackResult::Regular => C::Regular,
                AttackResult::Blocked => C::Blocked,
                AttackResult::Error => C::Error,
            },
            Action::Dig(r) => match r {
                DigResult::Excellent => C::Excellent,
                DigResult::Error => C::Error,
            },
            Action::Block(r) => match r {
                BlockResult::Point => C::Point,
                BlockResult::Error => C::Error,
            },
            Action::OpponentPoint | Action::OpponentError | Action::OwnTeamError => return None,
        };
        Some(code)
    }

    /// True when the action needs a named subject player.
    pub fn is_player_scoped(&self) -> bool {
        !self.kind().is_generic()
    }
}
