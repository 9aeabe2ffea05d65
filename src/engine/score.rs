//! Score engine: per-event rally winner and the score fold.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::{
    action::{Action, AttackResult, BlockResult, ServeResult},
    core::ledger::EventLedger,
    event::EventRecord,
    types::{SetNumber, Team},
};

/// Point tally for one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Score {
    /// Points of the scouted team.
    pub a: u32,
    /// Points of the opponent.
    pub b: u32,
}

impl Score {
    /// Score from explicit totals.
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// Adds one point to `team`.
    pub fn credit(&mut self, team: Team) {
        match team {
            Team::A => self.a += 1,
            Team::B => self.b += 1,
        }
    }

    /// Points played.
    pub fn total(&self) -> u32 {
        self.a + self.b
    }
}

impl Index<Team> for Score {
    type Output = u32;

    fn index(&self, team: Team) -> &u32 {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }
}

/// Team credited with the point by this event, if any.
///
/// Serve, attack and block close the rally on `Point` (acting team) or
/// `Error` (other team). Reception, dig and every other code are quality
/// entries and decide nothing.
pub fn rally_winner(event: &EventRecord) -> Option<Team> {
    action_winner(&event.action, event.team)
}

/// Same mapping as [`rally_winner`] for a bare action and acting team.
pub fn action_winner(action: &Action, team: Team) -> Option<Team> {
    match action {
        Action::Serve(ServeResult::Point) | Action::Attack(AttackResult::Point) | Action::Block(BlockResult::Point) => {
            Some(team)
        }
        Action::Serve(ServeResult::Error) | Action::Attack(AttackResult::Error) | Action::Block(BlockResult::Error) => {
            Some(team.other())
        }
        Action::OpponentError => Some(Team::A),
        Action::OpponentPoint | Action::OwnTeamError => Some(Team::B),
        _ => None,
    }
}

/// Full fold from {0, 0}.
pub fn score_events<'a>(events: impl IntoIterator<Item = &'a EventRecord>) -> Score {
    events
        .into_iter()
        .filter_map(rally_winner)
        .fold(Score::default(), |mut score, team| {
            score.credit(team);
            score
        })
}

/// Score of one set.
pub fn score_for_set(ledger: &EventLedger, set: SetNumber) -> Score {
    score_events(ledger.events_for_set(set))
}

/// Per-set score for every set present in the ledger.
pub fn set_scores(ledger: &EventLedger) -> BTreeMap<SetNumber, Score> {
    ledger
        .set_numbers()
        .into_iter()
        .map(|set| (set, score_for_set(ledger, set)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{DigResult, ReceptionResult};

    #[test]
    fn terminal_fundamentals_credit_acting_or_other_team() {
        assert_eq!(action_winner(&Action::Attack(AttackResult::Point), Team::A), Some(Team::A));
        assert_eq!(action_winner(&Action::Serve(ServeResult::Error), Team::A), Some(Team::B));
        assert_eq!(action_winner(&Action::Block(BlockResult::Error), Team::B), Some(Team::A));
        assert_eq!(action_winner(&Action::Attack(AttackResult::Blocked), Team::A), None);
        assert_eq!(action_winner(&Action::Serve(ServeResult::Good), Team::A), None);
    }

    #[test]
    fn quality_fundamentals_never_score() {
        assert_eq!(action_winner(&Action::Reception(ReceptionResult::Error), Team::A), None);
        assert_eq!(action_winner(&Action::Dig(DigResult::Error), Team::A), None);
    }

    #[test]
    fn generic_events_credit_fixed_teams() {
        assert_eq!(action_winner(&Action::OpponentError, Team::A), Some(Team::A));
        assert_eq!(action_winner(&Action::OpponentPoint, Team::B), Some(Team::B));
        assert_eq!(action_winner(&Action::OwnTeamError, Team::B), Some(Team::B));
    }
}
