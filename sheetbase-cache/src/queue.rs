//! Ordered save queue.
//!
//! One worker task per cache uploads jobs strictly in enqueue order and never
//! starts a job before the previous one has finished. A failed or panicking
//! job is reported and skipped; the worker carries on with the next one.

use crate::observer::EventSink;
use futures_util::FutureExt;
use sheetbase_client::DocumentRemote;
use sheetbase_core::{CacheError, CacheEvent, Document, EndpointError, PartitionKey};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One full-document upload. `snapshot` is the document as of the write that
/// produced the job, transient keys already removed.
#[derive(Debug, Clone)]
pub(crate) struct SaveJob {
    pub(crate) sequence: u64,
    pub(crate) snapshot: Document,
}

enum SaveCommand {
    Save(SaveJob),
    /// Acknowledged once every earlier command has been processed.
    Flush(oneshot::Sender<()>),
}

/// Handle to a running save worker.
#[derive(Debug)]
pub(crate) struct SaveQueue {
    sender: mpsc::UnboundedSender<SaveCommand>,
    pending: Arc<AtomicUsize>,
}

impl std::fmt::Debug for SaveCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save(job) => f.debug_tuple("Save").field(&job.sequence).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl SaveQueue {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The worker holds no reference to the cache. It exits after the last
    /// queue handle is dropped and every queued job has run.
    pub(crate) fn spawn(
        remote: Arc<dyn DocumentRemote>,
        partition: PartitionKey,
        events: EventSink,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = SaveWorker {
            remote,
            partition,
            events,
            pending: pending.clone(),
        };
        tokio::spawn(worker.run(receiver));
        Self { sender, pending }
    }

    pub(crate) fn enqueue(&self, job: SaveJob) -> Result<(), CacheError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.sender.send(SaveCommand::Save(job)).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            CacheError::QueueClosed
        })
    }

    /// Wait until every job enqueued before this call has finished.
    pub(crate) async fn flush(&self) -> Result<(), CacheError> {
        let (ack, done) = oneshot::channel();
        self.sender
            .send(SaveCommand::Flush(ack))
            .map_err(|_| CacheError::QueueClosed)?;
        done.await.map_err(|_| CacheError::QueueClosed)
    }

    /// Jobs enqueued but not yet finished, including one in flight.
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

struct SaveWorker {
    remote: Arc<dyn DocumentRemote>,
    partition: PartitionKey,
    events: EventSink,
    pending: Arc<AtomicUsize>,
}

impl SaveWorker {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<SaveCommand>) {
        tracing::debug!(partition = %self.partition, "Save worker started");
        while let Some(command) = receiver.recv().await {
            match command {
                SaveCommand::Save(job) => {
                    self.run_save_job(job).await;
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                }
                SaveCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        tracing::debug!(partition = %self.partition, "Save worker stopped");
    }

    async fn run_save_job(&self, job: SaveJob) {
        let sequence = job.sequence;
        tracing::debug!(
            partition = %self.partition,
            sequence,
            keys = job.snapshot.len(),
            "Uploading document"
        );

        let upload = self.remote.persist_document(&self.partition, &job.snapshot);
        let outcome = match AssertUnwindSafe(upload).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(EndpointError::transport("save task panicked")),
        };

        let event = match outcome {
            Ok(()) => CacheEvent::SaveSucceeded {
                partition: self.partition.clone(),
                sequence,
            },
            Err(error) => CacheEvent::SaveFailed {
                partition: self.partition.clone(),
                sequence,
                error,
            },
        };
        self.events.emit(event);
    }
}
