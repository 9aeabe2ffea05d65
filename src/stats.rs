//! Per-player statistics and flat event rows for exporters.
//!
//! The statistics table groups the ledger by (player, fundamental, result
//! code) and counts; every roster player gets a row, even with no events.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionKind, ResultCode},
    config::MatchConfig,
    core::ledger::EventLedger,
    event::{EventRecord, Subject},
    state::rotation_label,
    types::{EventSeq, PlayerId, SetNumber, Team},
};

/// Counts for one fundamental, in vocabulary order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTally {
    /// Fundamental counted.
    pub kind: ActionKind,
    /// Count per result code.
    pub counts: Vec<(ResultCode, u32)>,
    /// Sum of `counts`.
    pub total: u32,
}

impl KindTally {
    fn empty(kind: ActionKind) -> Self {
        Self {
            kind,
            counts: kind.result_codes().iter().map(|c| (*c, 0)).collect(),
            total: 0,
        }
    }

    fn bump(&mut self, code: ResultCode) {
        if let Some((_, n)) = self.counts.iter_mut().find(|(c, _)| *c == code) {
            *n += 1;
            self.total += 1;
        }
    }

    /// Count for one code, zero when absent.
    pub fn count(&self, code: ResultCode) -> u32 {
        self.counts
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// One statistics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Player name.
    pub player: PlayerId,
    /// One tally per fundamental, in [`ActionKind::FUNDAMENTALS`] order.
    pub tallies: Vec<KindTally>,
}

impl PlayerStats {
    fn empty(player: PlayerId) -> Self {
        Self {
            player,
            tallies: ActionKind::FUNDAMENTALS.into_iter().map(KindTally::empty).collect(),
        }
    }

    /// Tally of one fundamental.
    pub fn tally(&self, kind: ActionKind) -> Option<&KindTally> {
        self.tallies.iter().find(|t| t.kind == kind)
    }

    /// Values aligned with [`StatsTable::columns`].
    pub fn values(&self) -> Vec<u32> {
        self.tallies
            .iter()
            .flat_map(|t| t.counts.iter().map(|(_, n)| *n).chain(std::iter::once(t.total)))
            .collect()
    }
}

/// Statistics rows in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsTable {
    /// One row per roster player.
    pub rows: Vec<PlayerStats>,
}

impl StatsTable {
    /// Flat column names, `KIND_Code` per result code then `KIND_Tot`.
    pub fn columns() -> Vec<String> {
        ActionKind::FUNDAMENTALS
            .into_iter()
            .flat_map(|kind| {
                kind.result_codes()
                    .iter()
                    .map(move |code| format!("{}_{code}", kind.code()))
                    .chain(std::iter::once(format!("{}_Tot", kind.code())))
            })
            .collect()
    }

    /// Row of one player.
    pub fn player(&self, name: &str) -> Option<&PlayerStats> {
        self.rows.iter().find(|r| r.player == name)
    }
}

/// Builds the statistics table over one set, or every set when `set` is `None`.
pub fn player_stats(ledger: &EventLedger, config: &MatchConfig, set: Option<SetNumber>) -> StatsTable {
    let mut rows: Vec<PlayerStats> = config
        .roster
        .players()
        .iter()
        .map(|p| PlayerStats::empty(p.name.clone()))
        .collect();
    let index: HashMap<&str, usize> = config
        .roster
        .players()
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    for event in ledger.iter().filter(|e| set.is_none_or(|s| e.set_number == s)) {
        let (Some(name), Some(code)) = (event.subject.player(), event.action.result_code()) else {
            continue;
        };
        let Some(row) = index.get(name).and_then(|i| rows.get_mut(*i)) else {
            continue;
        };
        let kind = event.action.kind();
        if let Some(tally) = row.tallies.iter_mut().find(|t| t.kind == kind) {
            tally.bump(code);
        }
    }

    StatsTable { rows }
}

/// One ledger event flattened for spreadsheet-style export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Set of the event.
    pub set: SetNumber,
    /// Ledger sequence.
    pub seq: EventSeq,
    /// Team display name.
    pub team: String,
    /// Player name or [`GENERIC_SUBJECT`].
    pub subject: String,
    /// Action kind.
    pub action: ActionKind,
    /// Result code; `None` for generic events.
    pub code: Option<ResultCode>,
    /// Operator note, empty when absent.
    pub note: String,
    /// Serving team at record time.
    pub serving: Option<Team>,
    /// Setter rotation label at record time.
    pub rotation: String,
}

/// Subject label of generic events.
pub const GENERIC_SUBJECT: &str = "Generic event";

impl EventRow {
    /// Flattens one event.
    pub fn from_event(event: &EventRecord, config: &MatchConfig) -> Self {
        Self {
            set: event.set_number,
            seq: event.seq,
            team: config.team_names.name(event.team).to_string(),
            subject: match &event.subject {
                Subject::Player(name) => name.clone(),
                Subject::Generic => GENERIC_SUBJECT.to_string(),
            },
            action: event.action.kind(),
            code: event.action.result_code(),
            note: event.note.clone().unwrap_or_default(),
            serving: event.snapshot.serving_team,
            rotation: rotation_label(event.snapshot.setter_slot),
        }
    }
}

/// Export rows for the whole ledger in order.
pub fn event_rows(ledger: &EventLedger, config: &MatchConfig) -> Vec<EventRow> {
    ledger.iter().map(|e| EventRow::from_event(e, config)).collect()
}
