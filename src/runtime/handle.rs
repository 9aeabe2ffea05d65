use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

use crate::{
    config::{ConfigError, MatchConfig},
    engine::EngineError,
    event::{EventDraft, EventRecord},
    persist::{OpSink, PersistError},
    session::{MatchSession, SessionError},
    state::MatchState,
    stats::StatsTable,
    types::{EventSeq, OpSeq, SetNumber},
};

use super::{
    events::ScoutEvent,
    worker::{PersistMsg, spawn_worker},
};

/// Errors returned through [`ScoutHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("runtime channel closed")]
    ChannelClosed,
}

/// Runtime and persistence tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Flush the sink after every appended event.
    pub flush_on_append: bool,
    /// Ops buffered before a forced write.
    pub batch_max_ops: usize,
    /// Longest a buffered op waits for a write.
    pub batch_max_latency_ms: u64,
    /// Capacity of the persistence queue.
    pub persist_queue_bound: usize,
    /// Ops between automatic snapshots; zero disables them.
    pub snapshot_every_ops: usize,
    /// Delete journal rows covered by a snapshot.
    pub compact_after_snapshot: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_on_append: true,
            batch_max_ops: 32,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
            snapshot_every_ops: 500,
            compact_after_snapshot: false,
        }
    }
}

/// Cloneable handle to the single-writer scouting loop.
#[derive(Clone)]
pub struct ScoutHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<ScoutEvent>,
}

type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;

enum Command {
    Record { draft: EventDraft, resp: Reply<EventSeq> },
    Remove { seq: EventSeq, resp: Reply<EventRecord> },
    Undo { resp: Reply<()> },
    Redo { resp: Reply<()> },
    State { resp: Reply<MatchState> },
    Stats { set: Option<SetNumber>, resp: oneshot::Sender<StatsTable> },
    EventsForSet { set: SetNumber, resp: oneshot::Sender<Vec<EventRecord>> },
    Reconfigure { config: Box<MatchConfig>, resp: Reply<()> },
    Flush { resp: Reply<OpSeq> },
    Checkpoint { resp: Reply<()> },
    Shutdown { resp: Reply<()> },
}

struct ScoutLoop {
    session: MatchSession,
    events_tx: broadcast::Sender<ScoutEvent>,
    persist_tx: Option<mpsc::Sender<PersistMsg>>,
    config: RuntimeConfig,
    ops_since_snapshot: usize,
}

/// Spawns the single-writer loop owning `session`.
pub fn spawn_scout(session: MatchSession, sink: Option<Box<dyn OpSink>>, config: RuntimeConfig) -> ScoutHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<ScoutEvent>(1024);

    let mut durable_rx = None;
    let persist_tx = sink.map(|sink| {
        let (tx, rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound.max(1));
        let (durable_tx, durable) = mpsc::unbounded_channel();
        spawn_worker(sink, rx, durable_tx, &config);
        durable_rx = Some(durable);
        tx
    });

    let scout = ScoutLoop {
        session,
        events_tx: events_tx.clone(),
        persist_tx,
        config,
        ops_since_snapshot: 0,
    };
    tokio::spawn(scout.run(cmd_rx, durable_rx));

    ScoutHandle { cmd_tx, events_tx }
}

impl ScoutHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ScoutEvent> {
        self.events_tx.subscribe()
    }

    /// Records one event; see [`MatchSession::record`].
    pub async fn record(&self, draft: EventDraft) -> Result<EventSeq, RuntimeError> {
        self.request(|resp| Command::Record { draft, resp }).await?
    }

    pub async fn remove(&self, seq: EventSeq) -> Result<EventRecord, RuntimeError> {
        self.request(|resp| Command::Remove { seq, resp }).await?
    }

    pub async fn undo(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Undo { resp }).await?
    }

    pub async fn redo(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Redo { resp }).await?
    }

    pub async fn state(&self) -> Result<MatchState, RuntimeError> {
        self.request(|resp| Command::State { resp }).await?
    }

    pub async fn stats(&self, set: Option<SetNumber>) -> Result<StatsTable, RuntimeError> {
        self.request(|resp| Command::Stats { set, resp }).await
    }

    pub async fn events_for_set(&self, set: SetNumber) -> Result<Vec<EventRecord>, RuntimeError> {
        self.request(|resp| Command::EventsForSet { set, resp }).await
    }

    pub async fn reconfigure(&self, config: MatchConfig) -> Result<(), RuntimeError> {
        let config = Box::new(config);
        self.request(|resp| Command::Reconfigure { config, resp }).await?
    }

    /// Waits until every op handed to persistence is durable.
    pub async fn flush(&self) -> Result<OpSeq, RuntimeError> {
        self.request(|resp| Command::Flush { resp }).await?
    }

    /// Writes a ledger snapshot through the sink.
    pub async fn checkpoint(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Checkpoint { resp }).await?
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        ask(&self.cmd_tx, build).await
    }
}

/// Sends a request carrying a reply channel and waits for the reply.
async fn ask<M, T>(tx: &mpsc::Sender<M>, build: impl FnOnce(oneshot::Sender<T>) -> M) -> Result<T, RuntimeError> {
    let (resp, rx) = oneshot::channel();
    tx.send(build(resp)).await.map_err(|_| RuntimeError::ChannelClosed)?;
    rx.await.map_err(|_| RuntimeError::ChannelClosed)
}

impl ScoutLoop {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut durable_rx: Option<mpsc::UnboundedReceiver<Result<OpSeq, PersistError>>>,
    ) {
        info!(set = self.session.current_set(), "scout runtime started");
        if let Err(err) = self.save_config().await {
            warn!(%err, "initial match config not stored");
        }
        let mut durable_open = durable_rx.is_some();

        loop {
            let cmd = match durable_rx.as_mut() {
                Some(durable) if durable_open => tokio::select! {
                    cmd = cmd_rx.recv() => cmd,
                    report = durable.recv() => {
                        match report {
                            Some(Ok(op_seq)) => {
                                let _ = self.events_tx.send(ScoutEvent::DurableUpTo { op_seq });
                            }
                            Some(Err(err)) => warn!(%err, "persistence failed"),
                            None => durable_open = false,
                        }
                        continue;
                    }
                },
                _ => cmd_rx.recv().await,
            };
            let Some(cmd) = cmd else { break };
            if self.handle(cmd).await {
                break;
            }
        }
        info!("scout runtime stopped");
    }

    /// Returns `true` when the loop should stop.
    async fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Record { draft, resp } => {
                let res = self.session.record(draft).map_err(RuntimeError::from);
                let res = res.and_then(|seq| self.publish(ScoutEvent::Recorded { seq }).map(|_| seq));
                if res.is_ok() {
                    self.maybe_auto_checkpoint().await;
                }
                let _ = resp.send(res);
            }
            Command::Remove { seq, resp } => {
                let res = self.session.remove(seq).map_err(RuntimeError::from);
                let res = res.and_then(|event| self.publish(ScoutEvent::Removed { seq }).map(|_| event));
                let _ = resp.send(res);
            }
            Command::Undo { resp } => {
                let res = self.session.undo().map_err(RuntimeError::from);
                let _ = resp.send(res.and_then(|_| self.publish(ScoutEvent::UndoApplied)));
            }
            Command::Redo { resp } => {
                let res = self.session.redo().map_err(RuntimeError::from);
                let _ = resp.send(res.and_then(|_| self.publish(ScoutEvent::RedoApplied)));
            }
            Command::State { resp } => {
                let _ = resp.send(self.session.state().map_err(RuntimeError::from));
            }
            Command::Stats { set, resp } => {
                let _ = resp.send(self.session.stats(set));
            }
            Command::EventsForSet { set, resp } => {
                let _ = resp.send(self.session.ledger().events_for_set_cloned(set));
            }
            Command::Reconfigure { config, resp } => {
                let res = match self.session.reconfigure(*config) {
                    Ok(()) => self.save_config().await,
                    Err(err) => Err(err.into()),
                };
                let _ = resp.send(res.and_then(|_| self.publish(ScoutEvent::Reconfigured)));
            }
            Command::Flush { resp } => {
                let out = match &self.persist_tx {
                    Some(tx) => ask(tx, |resp| PersistMsg::Flush { resp })
                        .await
                        .and_then(|r| r.map_err(RuntimeError::from)),
                    None => Ok(self.session.latest_op_seq()),
                };
                let _ = resp.send(out);
            }
            Command::Checkpoint { resp } => {
                let out = self.checkpoint().await;
                if out.is_ok() {
                    self.ops_since_snapshot = 0;
                }
                let _ = resp.send(out);
            }
            Command::Shutdown { resp } => {
                let out = match &self.persist_tx {
                    Some(tx) => ask(tx, |resp| PersistMsg::Shutdown { resp }).await,
                    None => Ok(()),
                };
                let _ = resp.send(out);
                return true;
            }
        }
        false
    }

    /// Hands pending ops to persistence and announces the change.
    fn publish(&mut self, event: ScoutEvent) -> Result<(), RuntimeError> {
        let ops = self.session.drain_pending_ops();
        self.ops_since_snapshot += ops.len();
        match &self.persist_tx {
            Some(tx) => {
                for stored in ops {
                    tx.try_send(PersistMsg::Op(stored)).map_err(|err| {
                        RuntimeError::Persist(PersistError::Message(format!("persist queue error: {err}")))
                    })?;
                }
            }
            None => {
                let op_seq = self.session.latest_op_seq();
                let _ = self.events_tx.send(ScoutEvent::DurableUpTo { op_seq });
            }
        }

        let _ = self.events_tx.send(event);
        if let Ok(state) = self.session.state() {
            let _ = self.events_tx.send(ScoutEvent::StateChanged(Box::new(state)));
        }
        Ok(())
    }

    async fn checkpoint(&self) -> Result<(), RuntimeError> {
        let Some(tx) = &self.persist_tx else {
            return Ok(());
        };
        let snapshot = self.session.ledger().export_snapshot();
        let last_seq = self.session.latest_op_seq();
        let compact = self.config.compact_after_snapshot;
        ask(tx, |resp| PersistMsg::Checkpoint {
            snapshot,
            last_seq,
            compact,
            resp,
        })
        .await?
        .map_err(RuntimeError::from)
    }

    /// Recovery replays the journal against the stored config, so it has to
    /// follow every reconfiguration.
    async fn save_config(&self) -> Result<(), RuntimeError> {
        let Some(tx) = &self.persist_tx else {
            return Ok(());
        };
        let config = Box::new(self.session.config().clone());
        ask(tx, |resp| PersistMsg::SaveConfig { config, resp })
            .await?
            .map_err(RuntimeError::from)
    }

    async fn maybe_auto_checkpoint(&mut self) {
        let every = self.config.snapshot_every_ops;
        if every == 0 || self.ops_since_snapshot < every || self.persist_tx.is_none() {
            return;
        }
        match self.checkpoint().await {
            Ok(()) => self.ops_since_snapshot = 0,
            Err(RuntimeError::ChannelClosed) => {}
            Err(err) => {
                warn!(%err, "auto checkpoint failed");
                self.ops_since_snapshot = 0;
            }
        }
    }
}
