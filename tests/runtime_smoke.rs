use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use volleylog::{
    action::{Action, AttackResult},
    config::MatchConfig,
    engine::{EngineError, lineup::LineupDraft, score::Score},
    event::EventDraft,
    op::StoredOp,
    persist::{OpSink, PersistResult, sqlite::SqliteOpSink},
    roster::{Player, Role, Roster},
    runtime::{
        events::ScoutEvent,
        handle::{RuntimeConfig, RuntimeError, spawn_scout},
    },
    session::{MatchSession, SessionError},
    types::{OpSeq, Team},
};

fn config() -> MatchConfig {
    let names = ["P1", "P2", "P3", "P4", "P5", "P6"];
    let roster = Roster::new(names.iter().map(|n| Player::new(*n, None, Role::Regular)).collect()).unwrap();
    MatchConfig::new(roster, Team::A, LineupDraft::new(names, None))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn point(name: &str) -> EventDraft {
    EventDraft::player(1, Team::A, name, Action::Attack(AttackResult::Point))
}

/// Journal that takes `stall` per batch and remembers what it wrote.
struct StallingJournal {
    written: Arc<Mutex<Vec<OpSeq>>>,
    stall: Duration,
}

impl OpSink for StallingJournal {
    fn append_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq> {
        std::thread::sleep(self.stall);
        let mut written = self.written.lock().expect("journal lock");
        written.extend(ops.iter().map(|stored| stored.seq));
        Ok(written.last().copied().unwrap_or(0))
    }
}

#[tokio::test]
async fn runtime_record_remove_and_events_ordered() {
    init_tracing();
    let handle = spawn_scout(MatchSession::new(config()), None, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let seq = handle.record(point("P1")).await.expect("record");
    handle.remove(seq).await.expect("remove");

    let state = handle.state().await.expect("state");
    assert_eq!(state.score, Score::default());

    let mut seen = Vec::new();
    for _ in 0..8 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        match evt {
            ScoutEvent::Recorded { .. } | ScoutEvent::Removed { .. } => seen.push(evt),
            ScoutEvent::StateChanged(state) if seen.len() == 1 => {
                assert_eq!(state.score, Score::new(1, 0));
            }
            _ => {}
        }
        if seen.len() == 2 {
            break;
        }
    }

    assert_eq!(seen[0], ScoutEvent::Recorded { seq });
    assert_eq!(seen[1], ScoutEvent::Removed { seq });

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn runtime_undo_redo_and_queries() {
    let handle = spawn_scout(MatchSession::new(config()), None, RuntimeConfig::default());

    handle.record(point("P1")).await.expect("record");
    handle
        .record(EventDraft::generic(1, Action::OpponentPoint))
        .await
        .expect("record generic");
    handle.undo().await.expect("undo");
    assert_eq!(handle.state().await.expect("state").score, Score::new(1, 0));
    handle.redo().await.expect("redo");

    let state = handle.state().await.expect("state");
    assert_eq!(state.score, Score::new(1, 1));
    assert_eq!(state.serving_team, Team::B);

    let events = handle.events_for_set(1).await.expect("events");
    assert_eq!(events.len(), 2);

    let stats = handle.stats(None).await.expect("stats");
    let p1 = stats.player("P1").expect("row");
    assert_eq!(p1.tally(Action::Attack(AttackResult::Point).kind()).map(|t| t.total), Some(1));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn rejected_command_leaves_runtime_usable() {
    let mut incomplete = config();
    let lineup = LineupDraft::new(["P1", "P2", "P3", "P4", "P5", ""], None);
    incomplete.set_config_mut(1).starting_lineup = lineup;
    let handle = spawn_scout(MatchSession::new(incomplete), None, RuntimeConfig::default());

    let err = handle.record(point("P1")).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Session(SessionError::Engine(EngineError::IncompleteLineup { .. }))
    ));

    handle.reconfigure(config()).await.expect("reconfigure");
    let seq = handle.record(point("P1")).await.expect("record after fix");
    assert_eq!(seq, 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn stalled_journal_reports_durability_then_rejects_overflow() {
    init_tracing();
    let written = Arc::new(Mutex::new(Vec::new()));
    let journal = StallingJournal {
        written: Arc::clone(&written),
        stall: Duration::from_millis(250),
    };
    let runtime = RuntimeConfig {
        persist_queue_bound: 1,
        batch_max_latency_ms: 500,
        snapshot_every_ops: 0,
        ..RuntimeConfig::default()
    };

    let handle = spawn_scout(MatchSession::new(config()), Some(Box::new(journal)), runtime);
    let mut sub = handle.subscribe();
    assert_eq!(handle.record(point("P1")).await.expect("first record"), 1);

    let durable = loop {
        let evt = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("durable report in time")
            .expect("stream open");
        if let ScoutEvent::DurableUpTo { op_seq } = evt {
            break op_seq;
        }
    };
    assert_eq!(durable, 1);

    let mut rejected = None;
    for (i, name) in ["P2", "P3", "P4", "P5", "P6", "P1"].iter().cycle().take(12).enumerate() {
        match handle.record(point(name)).await {
            Ok(_) => {}
            Err(RuntimeError::Persist(err)) => {
                rejected = Some((i, err.to_string()));
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    let (_, message) = rejected.expect("full queue surfaces as a persistence error");
    assert!(message.contains("persist queue"));

    handle.shutdown().await.expect("shutdown");
    assert_eq!(written.lock().expect("journal lock").first(), Some(&1));
}

#[tokio::test]
async fn reconfiguration_is_what_recovery_replays_against() {
    init_tracing();
    let tmp = tempfile::TempDir::new().expect("tmp");
    let db_path = tmp.path().join("scout.db");

    let mut sink = SqliteOpSink::open(&db_path).expect("open");
    sink.save_config(&config()).expect("save initial config");
    let session = sink.load_session(config()).expect("load");
    let handle = spawn_scout(session, Some(Box::new(sink)), RuntimeConfig::default());

    let mut receiving = config();
    receiving.set_config_mut(1).starting_server = Team::B;
    handle.reconfigure(receiving.clone()).await.expect("reconfigure");
    handle
        .record(EventDraft::generic(1, Action::OpponentPoint))
        .await
        .expect("record");
    let live = handle.state().await.expect("state");
    assert_eq!(live.serving_team, Team::B);
    assert_eq!(live.lineup.slots()[0], "P1");
    handle.shutdown().await.expect("shutdown");

    let reopened = SqliteOpSink::open(&db_path).expect("reopen");
    assert_eq!(reopened.load_config().expect("stored config"), Some(receiving));
    let recovered = reopened.load_session(config()).expect("recover");
    assert_eq!(recovered.state().expect("recovered state"), live);
}

#[tokio::test]
async fn runtime_stores_its_starting_config() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    let db_path = tmp.path().join("fresh.db");

    let mut scouted = config();
    scouted.team_names.a = "Lions".into();
    let sink = SqliteOpSink::open(&db_path).expect("open");
    let handle = spawn_scout(MatchSession::new(scouted.clone()), Some(Box::new(sink)), RuntimeConfig::default());
    handle.flush().await.expect("flush");
    handle.shutdown().await.expect("shutdown");

    let reopened = SqliteOpSink::open(&db_path).expect("reopen");
    assert_eq!(reopened.load_config().expect("stored config"), Some(scouted));
}
