/// SQLite journal sink.
pub mod sqlite;

use crate::{
    config::{ConfigError, MatchConfig},
    core::ledger::{LedgerError, LedgerSnapshotV1},
    op::StoredOp,
    types::OpSeq,
};

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite call failed.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Payload (de)serialization failed.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Journal replay was rejected by the ledger.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    /// Stored configuration is invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Other failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Destination for journaled ledger ops.
pub trait OpSink: Send {
    /// Appends ops, returning the highest durable sequence.
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq>;
    /// Forces buffered writes to storage.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
    /// Stores a ledger snapshot covering `last_seq`.
    fn write_snapshot(&mut self, _snapshot: &LedgerSnapshotV1, _last_seq: OpSeq) -> PersistResult<()> {
        Ok(())
    }
    /// Stores the configuration the journal is evaluated against.
    fn save_config(&mut self, _config: &MatchConfig) -> PersistResult<()> {
        Ok(())
    }
    /// Drops journal rows up to `seq`, returning the count.
    fn compact_through(&mut self, _seq: OpSeq) -> PersistResult<usize> {
        Ok(0)
    }
}
