//! Write-ahead event queue.
//!
//! The queue decouples the request path from storage latency. The cache pushes an
//! [`Event`] for every accepted mutation; a single consumer task applies events to
//! the [`StorageBackend`] strictly in arrival order.
//!
//! # Lifecycle
//!
//! ```text
//! Running --(cancellation)--> Draining --(intake empty)--> Drained
//! ```
//!
//! - **Running**: pushes are accepted. The intake is bounded, so a slow backend
//!   makes [`push`](WriteAheadQueue::push) wait for capacity.
//! - **Draining**: new pushes are discarded without error. Pushes that were already
//!   waiting for capacity still land, and every accepted event is applied, in order.
//! - **Drained**: everything accepted has been applied.
//!   [`wait_for_shutdown`](WriteAheadQueue::wait_for_shutdown) returns.
//!
//! # Failure policy
//!
//! A backend failure while applying an event is logged and counted, never retried.
//! The in-memory cache stays correct; the failed mutation is simply not durable.

use mea::mutex::Mutex;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    backend::StorageBackend,
    document::Document,
    error::{DatabaseError, DatabaseResult},
};

/// Default number of events the intake buffers before `push` waits.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The kind of mutation an [`Event`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// A mutation that has been accepted in memory but is not yet durable.
#[derive(Debug, Clone)]
pub struct Event {
    pub operation: Operation,
    /// Snapshot at the time of the mutation. For deletes, identity only.
    pub document: Arc<Document>,
}

impl Event {
    pub fn new(operation: Operation, document: Arc<Document>) -> Self {
        Self { operation, document }
    }

    pub fn create(document: impl Into<Arc<Document>>) -> Self {
        Self::new(Operation::Create, document.into())
    }

    pub fn update(document: impl Into<Arc<Document>>) -> Self {
        Self::new(Operation::Update, document.into())
    }

    pub fn delete(document: impl Into<Arc<Document>>) -> Self {
        Self::new(Operation::Delete, document.into())
    }
}

/// Lifecycle state of a [`WriteAheadQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Running,
    Draining,
    Drained,
}

/// Counters describing what the consumer has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Events applied to the backend successfully.
    pub processed: u64,
    /// Events whose backend call failed and were dropped.
    pub failed: u64,
}

/// Ordered, single-consumer queue that applies mutations to a storage backend.
pub struct WriteAheadQueue {
    backend: Arc<dyn StorageBackend>,
    /// Taken when draining starts. Each push holds its own clone while it waits.
    intake: Mutex<Option<mpsc::Sender<Event>>>,
    outlet: Mutex<Option<mpsc::Receiver<Event>>>,
    state: watch::Sender<QueueState>,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl WriteAheadQueue {
    /// Creates a queue in the Running state with an intake of `capacity` events.
    ///
    /// Nothing is applied to `backend` until [`start`](Self::start) is called.
    pub fn new(backend: Arc<dyn StorageBackend>, capacity: usize) -> Self {
        let (intake, outlet) = mpsc::channel(capacity.max(1));
        let (state, _) = watch::channel(QueueState::Running);

        Self {
            backend,
            intake: Mutex::new(Some(intake)),
            outlet: Mutex::new(Some(outlet)),
            state,
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            processed: self.processed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }

    /// Submits an event for durable application.
    ///
    /// Waits while the intake is full. A push that is already waiting when shutdown is
    /// requested is still applied during the drain. Once the queue has left the
    /// Running state new events are discarded and this returns immediately.
    pub async fn push(&self, event: Event) {
        let Some(intake) = self.intake.lock().await.clone() else {
            debug!(
                operation = ?event.operation,
                id = %event.document.id(),
                "queue is shutting down, discarding event"
            );
            return;
        };

        if let Err(mpsc::error::SendError(event)) = intake.send(event).await {
            debug!(
                operation = ?event.operation,
                id = %event.document.id(),
                "queue intake closed, discarding event"
            );
        }
    }

    /// Runs the consumer loop until `shutdown` is cancelled, then drains.
    ///
    /// Returns once every accepted event has been applied and the queue is Drained.
    /// A queue has exactly one consumer, so only the first call does any work.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueueAlreadyStarted`] on every call after the first.
    pub async fn start(&self, shutdown: CancellationToken) -> DatabaseResult<()> {
        let mut outlet = self
            .outlet
            .lock()
            .await
            .take()
            .ok_or(DatabaseError::QueueAlreadyStarted)?;

        debug!("write-ahead queue consumer started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = outlet.recv() => match event {
                    Some(event) => self.process(event).await,
                    None => break,
                },
            }
        }

        self.state.send_replace(QueueState::Draining);
        // The outlet ends once every in-flight push has dropped its clone.
        self.intake.lock().await.take();
        info!("write-ahead queue draining");

        let mut drained = 0usize;
        while let Some(event) = outlet.recv().await {
            self.process(event).await;
            drained += 1;
        }

        self.state.send_replace(QueueState::Drained);
        info!(drained, stats = ?self.stats(), "write-ahead queue drained");

        Ok(())
    }

    /// Runs [`start`](Self::start) on a new tokio task.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<DatabaseResult<()>> {
        let queue = Arc::clone(self);
        tokio::spawn(async move { queue.start(shutdown).await })
    }

    /// Waits until the queue reaches the Drained state.
    ///
    /// Safe to call at any time, including after the queue has already drained.
    pub async fn wait_for_shutdown(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = state.wait_for(|state| *state == QueueState::Drained).await;
    }

    async fn process(&self, event: Event) {
        let document = event.document.as_ref();
        let result = match event.operation {
            Operation::Create | Operation::Update => self.backend.write(document).await,
            Operation::Delete => self.backend.delete(document).await,
        };

        match result {
            Ok(()) => {
                self.processed.fetch_add(1, Ordering::AcqRel);
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::AcqRel);
                warn!(
                    operation = ?event.operation,
                    id = %document.id(),
                    collection = document.collection(),
                    error = %err,
                    "failed to apply event to storage, dropping it"
                );
            }
        }
    }
}

impl fmt::Debug for WriteAheadQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteAheadQueue")
            .field("backend", &self.backend)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}
