use crate::handler::EventHandler;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tether_core::{EventSink, LifecycleEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Delivery counters shared by a queue, its clones and its worker.
#[derive(Debug, Default)]
pub struct QueueStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
    handled: AtomicU64,
    failed: AtomicU64,
}

impl QueueStats {
    /// Events that made it into the channel.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Events discarded because the channel was full or the worker gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Events the handler processed successfully.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    /// Events the handler returned an error for.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// The sending half: a non-blocking [`EventSink`].
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<LifecycleEvent>,
    stats: Arc<QueueStats>,
}

/// The draining half, running on its own task.
#[derive(Debug)]
pub struct EventWorker {
    handle: JoinHandle<()>,
    stats: Arc<QueueStats>,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` undelivered events and
    /// spawns its worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or if called outside a tokio runtime.
    pub fn spawn<H: EventHandler>(capacity: usize, handler: H) -> (EventQueue, EventWorker) {
        let (tx, rx) = mpsc::channel(capacity);
        let stats = Arc::new(QueueStats::default());

        let handle = tokio::spawn(drain(rx, handler, Arc::clone(&stats)));

        (
            EventQueue {
                tx,
                stats: Arc::clone(&stats),
            },
            EventWorker { handle, stats },
        )
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl EventSink for EventQueue {
    fn push(&self, event: LifecycleEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(event)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(id = %event.id, opcode = %event.opcode, dropped, "event queue full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(id = %event.id, opcode = %event.opcode, dropped, "event worker gone, dropping event");
            }
        }
    }
}

impl EventWorker {
    /// Counters that stay readable after [`EventWorker::join`] consumes the
    /// worker.
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Waits for the worker to finish.
    ///
    /// The worker stops once every [`EventQueue`] clone has been dropped and
    /// the events already buffered have been handled.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "event worker terminated abnormally");
        }
    }
}

async fn drain<H: EventHandler>(
    mut rx: mpsc::Receiver<LifecycleEvent>,
    handler: H,
    stats: Arc<QueueStats>,
) {
    while let Some(event) = rx.recv().await {
        match handler.handle(&event).await {
            Ok(()) => {
                stats.handled.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(id = %event.id, opcode = %event.opcode, error = %e, "event handler failed");
            }
        }
    }
    debug!(
        handled = stats.handled(),
        failed = stats.failed(),
        dropped = stats.dropped(),
        "event worker stopped"
    );
}
