//! Background writer that batches journaled ops into an [`OpSink`].

use std::sync::Arc;

use tokio::{
    sync::{Mutex, mpsc, oneshot},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

use crate::{
    config::MatchConfig,
    core::ledger::LedgerSnapshotV1,
    op::{Op, StoredOp},
    persist::{OpSink, PersistError, PersistResult},
    types::OpSeq,
};

use super::handle::RuntimeConfig;

/// Requests from the scouting loop to the writer.
pub(crate) enum PersistMsg {
    Op(StoredOp),
    Flush {
        resp: oneshot::Sender<PersistResult<OpSeq>>,
    },
    Checkpoint {
        snapshot: LedgerSnapshotV1,
        last_seq: OpSeq,
        compact: bool,
        resp: oneshot::Sender<PersistResult<()>>,
    },
    SaveConfig {
        config: Box<MatchConfig>,
        resp: oneshot::Sender<PersistResult<()>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Durable sequence reports flowing back to the scouting loop.
pub(crate) type DurableTx = mpsc::UnboundedSender<PersistResult<OpSeq>>;

pub(crate) fn spawn_worker(
    sink: Box<dyn OpSink>,
    rx: mpsc::Receiver<PersistMsg>,
    durable_tx: DurableTx,
    config: &RuntimeConfig,
) {
    let worker = PersistWorker {
        sink: Arc::new(Mutex::new(sink)),
        buf: Vec::new(),
        last_durable: 0,
        durable_tx,
        batch_max_ops: config.batch_max_ops.max(1),
        flush_on_append: config.flush_on_append,
        max_latency: Duration::from_millis(config.batch_max_latency_ms),
    };
    tokio::spawn(worker.run(rx));
}

struct PersistWorker {
    sink: Arc<Mutex<Box<dyn OpSink>>>,
    buf: Vec<StoredOp>,
    last_durable: OpSeq,
    durable_tx: DurableTx,
    batch_max_ops: usize,
    flush_on_append: bool,
    max_latency: Duration,
}

impl PersistWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<PersistMsg>) {
        let mut deadline = Instant::now() + self.max_latency;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = self.write_buffered(true).await;
                        break;
                    };
                    match msg {
                        PersistMsg::Op(stored) => {
                            let urgent = self.flush_on_append && matches!(stored.op, Op::Append { .. });
                            self.buf.push(stored);
                            if urgent || self.buf.len() >= self.batch_max_ops {
                                let _ = self.write_buffered(true).await;
                                deadline = Instant::now() + self.max_latency;
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = self.write_buffered(true).await.map(|_| self.last_durable);
                            let _ = resp.send(result);
                            deadline = Instant::now() + self.max_latency;
                        }
                        PersistMsg::Checkpoint { snapshot, last_seq, compact, resp } => {
                            let _ = resp.send(self.checkpoint(snapshot, last_seq, compact).await);
                            deadline = Instant::now() + self.max_latency;
                        }
                        PersistMsg::SaveConfig { config, resp } => {
                            let saved = self.with_sink(move |sink| sink.save_config(&config)).await;
                            if let Err(err) = &saved {
                                warn!(%err, "saving match config failed");
                            }
                            let _ = resp.send(saved);
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = self.write_buffered(true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !self.buf.is_empty() => {
                    let _ = self.write_buffered(false).await;
                    deadline = Instant::now() + self.max_latency;
                }
            }
        }
        debug!(durable = self.last_durable, "persistence worker stopped");
    }

    /// Runs blocking sink work off the async threads.
    async fn with_sink<T, F>(&self, work: F) -> PersistResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn OpSink) -> PersistResult<T> + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || {
            let mut guard = sink.blocking_lock();
            work(&mut **guard)
        })
        .await
        .map_err(|e| PersistError::Message(format!("join error: {e}")))?
    }

    /// Appends the buffer; with `sync` the sink is flushed as well.
    async fn write_buffered(&mut self, sync: bool) -> PersistResult<()> {
        if self.buf.is_empty() {
            if sync {
                return self.with_sink(|sink| sink.flush()).await;
            }
            return Ok(());
        }

        let ops = std::mem::take(&mut self.buf);
        let count = ops.len();
        let written = self
            .with_sink(move |sink| {
                let seq = sink.append_ops(&ops)?;
                if sync {
                    sink.flush()?;
                }
                Ok(seq)
            })
            .await;

        match written {
            Ok(seq) => {
                self.last_durable = self.last_durable.max(seq);
                debug!(count, durable = self.last_durable, "ops persisted");
                let _ = self.durable_tx.send(Ok(self.last_durable));
                Ok(())
            }
            Err(err) => {
                warn!(%err, count, "journal append failed");
                let _ = self
                    .durable_tx
                    .send(Err(PersistError::Message(format!("append failed: {err}"))));
                Err(err)
            }
        }
    }

    async fn checkpoint(&mut self, snapshot: LedgerSnapshotV1, last_seq: OpSeq, compact: bool) -> PersistResult<()> {
        self.write_buffered(true).await?;
        self.with_sink(move |sink| {
            sink.write_snapshot(&snapshot, last_seq)?;
            if compact {
                sink.compact_through(last_seq)?;
            }
            Ok(())
        })
        .await
    }
}
