//! In-memory event ledger and index helpers.

/// Helper index aliases.
pub mod indices;
/// Authoritative event ledger with undo/redo.
#[allow(missing_docs)]
pub mod ledger;
