//! Live volleyball scouting: an append-only rally ledger and the rules that
//! derive score, service possession, and the rotating lineup from it.
//!
//! # Examples
//!
//! ```
//! use volleylog::{
//!     action::{Action, AttackResult},
//!     config::MatchConfig,
//!     engine::{lineup::LineupDraft, score::Score},
//!     roster::{Player, Role, Roster},
//!     session::MatchSession,
//!     types::Team,
//! };
//!
//! let roster = Roster::new(
//!     ["P1", "P2", "P3", "P4", "P5", "P6"]
//!         .into_iter()
//!         .map(|n| Player::new(n, None, Role::Regular))
//!         .collect(),
//! )
//! .expect("roster");
//! let lineup = LineupDraft::new(["P1", "P2", "P3", "P4", "P5", "P6"], None);
//! let mut session = MatchSession::new(MatchConfig::new(roster, Team::A, lineup));
//!
//! session.record_action("P1", Action::Attack(AttackResult::Point)).expect("record");
//! let state = session.state().expect("state");
//! assert_eq!(state.score, Score::new(1, 0));
//! assert_eq!(state.serving_team, Team::A);
//! ```
//!
//! Runtime usage with SQLite journaling:
//! ```no_run
//! use volleylog::{
//!     config::MatchConfig,
//!     persist::sqlite::SqliteOpSink,
//!     runtime::handle::{spawn_scout, RuntimeConfig},
//!     session::MatchSession,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = MatchConfig::load("match.json").expect("config");
//! let sink = SqliteOpSink::open("scout.db").expect("open sqlite");
//! let session: MatchSession = sink.load_session(config).expect("replay");
//! let handle = spawn_scout(session, Some(Box::new(sink)), RuntimeConfig::default());
//! let state = handle.state().await.expect("state");
//! println!("{} - {}", state.score.a, state.score.b);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Action kinds, result codes, and the closed action vocabulary.
pub mod action;
/// Match configuration loading and validation.
pub mod config;
/// Core in-memory ledger and index helpers.
pub mod core;
/// Score, rotation and libero engines plus the incremental projector.
pub mod engine;
/// Rally event records and drafts.
pub mod event;
/// Ledger mutation op model and persistence wrapper types.
pub mod op;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Roster and role tags.
pub mod roster;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Ledger, configuration and projection bundled per match.
pub mod session;
/// Derived match state.
pub mod state;
/// Per-player statistics and event export rows.
pub mod stats;
/// Shared primitive types.
pub mod types;

