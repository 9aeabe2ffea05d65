//! Single-writer async runtime and event stream APIs.

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
#[allow(missing_docs)]
pub mod handle;
/// Batching persistence writer.
mod worker;
