//! SQLite journal for the rally ledger.
//!
//! `ledger_ops` holds one versioned JSON envelope per journaled op, keyed by
//! op sequence and indexed by set. `ledger_snapshots` holds full ledger
//! snapshots; recovery starts from the newest one and replays the ops after
//! it. The match configuration is kept next to the journal so a recovered
//! ledger is evaluated against the lineup it was recorded with.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::MatchConfig,
    core::ledger::{EventLedger, LedgerSnapshotV1, now_ms},
    op::{OP_FORMAT_VERSION, Op, StoredOp, StoredOpEnvelope},
    session::MatchSession,
    types::{OpSeq, SetNumber},
};

use super::{OpSink, PersistError, PersistResult};

const SNAPSHOT_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    format_version: u16,
    snapshot: LedgerSnapshotV1,
}

/// SQLite implementation of [`OpSink`].
pub struct SqliteOpSink {
    conn: Connection,
}

impl SqliteOpSink {
    /// Opens or creates the journal at `path` in WAL mode.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Journal that lives only as long as the sink.
    pub fn open_in_memory() -> PersistResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Rebuilds the ledger from the newest snapshot plus the ops after it.
    pub fn load_ledger(&self) -> PersistResult<EventLedger> {
        let mut ledger = match self.latest_snapshot()? {
            Some(snapshot) => EventLedger::from_snapshot(snapshot)?,
            None => EventLedger::new(),
        };

        let from = ledger.latest_op_seq();
        let tail = self.load_ops_after(from)?;
        debug!(from, tail = tail.len(), "replaying ledger journal");
        for stored in tail {
            ledger.apply_replayed_op(stored)?;
        }
        Ok(ledger)
    }

    /// Recovers a session, preferring the stored configuration over `fallback`.
    pub fn load_session(&self, fallback: MatchConfig) -> PersistResult<MatchSession> {
        let config = self.load_config()?.unwrap_or(fallback);
        let ledger = self.load_ledger()?;
        info!(events = ledger.len(), set = config.current_set, "session recovered");
        Ok(MatchSession::with_ledger(config, ledger))
    }

    /// Ops with sequence strictly greater than `seq`, oldest first.
    pub fn load_ops_after(&self, seq: OpSeq) -> PersistResult<Vec<StoredOp>> {
        self.query_ops(
            "SELECT seq, ts_ms, payload FROM ledger_ops WHERE seq > ?1 ORDER BY seq",
            seq as i64,
        )
    }

    /// Journal trail of one set, including removals and undos.
    pub fn ops_for_set(&self, set: SetNumber) -> PersistResult<Vec<StoredOp>> {
        self.query_ops(
            "SELECT seq, ts_ms, payload FROM ledger_ops WHERE set_no = ?1 ORDER BY seq",
            i64::from(set),
        )
    }

    /// Stores `config`, replacing any earlier one.
    pub fn save_config(&mut self, config: &MatchConfig) -> PersistResult<()> {
        let payload = serde_json::to_vec(config)?;
        self.conn.execute(
            "INSERT INTO match_config(id, ts_ms, payload) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET ts_ms = excluded.ts_ms, payload = excluded.payload",
            params![now_ms() as i64, payload],
        )?;
        Ok(())
    }

    /// Stored configuration, validated.
    pub fn load_config(&self) -> PersistResult<Option<MatchConfig>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT payload FROM match_config WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        let config: MatchConfig = serde_json::from_slice(&payload)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Stores a snapshot that covers every op up to `last_seq`.
    pub fn write_snapshot(&mut self, snapshot: &LedgerSnapshotV1, last_seq: OpSeq) -> PersistResult<()> {
        let payload = serde_json::to_vec(&SnapshotEnvelope {
            format_version: SNAPSHOT_FORMAT_VERSION,
            snapshot: snapshot.clone(),
        })?;
        self.conn.execute(
            "INSERT INTO ledger_snapshots(last_seq, ts_ms, payload) VALUES (?1, ?2, ?3)",
            params![last_seq as i64, now_ms() as i64, payload],
        )?;
        debug!(last_seq, events = snapshot.events.len(), "ledger snapshot written");
        Ok(())
    }

    /// Deletes journal rows up to and including `seq`.
    pub fn compact_through(&mut self, seq: OpSeq) -> PersistResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM ledger_ops WHERE seq <= ?1", params![seq as i64])?;
        debug!(seq, removed, "journal compacted");
        Ok(removed)
    }

    /// Highest op sequence in the journal, zero when empty.
    pub fn latest_seq(&self) -> PersistResult<OpSeq> {
        let seq: Option<i64> = self
            .conn
            .query_row("SELECT MAX(seq) FROM ledger_ops", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(seq.unwrap_or(0) as OpSeq)
    }

    fn latest_snapshot(&self) -> PersistResult<Option<LedgerSnapshotV1>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM ledger_snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(payload) = payload else {
            return Ok(None);
        };

        let envelope: SnapshotEnvelope = serde_json::from_slice(&payload)?;
        if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(PersistError::Message(format!(
                "unsupported snapshot format: {}",
                envelope.format_version
            )));
        }
        Ok(Some(envelope.snapshot))
    }

    fn query_ops(&self, sql: &str, arg: i64) -> PersistResult<Vec<StoredOp>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![arg], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, Vec<u8>>(2)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (seq, ts_ms, payload) = row?;
            out.push(decode_op(seq, ts_ms, &payload)?);
        }
        Ok(out)
    }
}

impl OpSink for SqliteOpSink {
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        let Some(last) = ops.last() else {
            return self.latest_seq();
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ledger_ops(seq, ts_ms, kind, event_seq, set_no, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for stored in ops {
                let event = stored.op.event();
                stmt.execute(params![
                    stored.seq as i64,
                    stored.ts_ms as i64,
                    op_kind(&stored.op),
                    event.seq as i64,
                    i64::from(event.set_number),
                    serde_json::to_vec(&StoredOpEnvelope::new(stored.clone()))?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(last.seq)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }

    fn write_snapshot(&mut self, snapshot: &LedgerSnapshotV1, last_seq: OpSeq) -> PersistResult<()> {
        SqliteOpSink::write_snapshot(self, snapshot, last_seq)
    }

    fn save_config(&mut self, config: &MatchConfig) -> PersistResult<()> {
        SqliteOpSink::save_config(self, config)
    }

    fn compact_through(&mut self, seq: OpSeq) -> PersistResult<usize> {
        SqliteOpSink::compact_through(self, seq)
    }
}

fn op_kind(op: &Op) -> i64 {
    match op {
        Op::Append { .. } => 1,
        Op::Remove { .. } => 2,
    }
}

/// Decodes one journal row; the row's columns are authoritative for seq and time.
fn decode_op(seq: i64, ts_ms: i64, payload: &[u8]) -> PersistResult<StoredOp> {
    let envelope: StoredOpEnvelope = serde_json::from_slice(payload)?;
    if envelope.format_version != OP_FORMAT_VERSION {
        return Err(PersistError::Message(format!(
            "unsupported op format version: {}",
            envelope.format_version
        )));
    }
    let mut stored = envelope.stored;
    stored.seq = seq as OpSeq;
    stored.ts_ms = ts_ms as u64;
    Ok(stored)
}
