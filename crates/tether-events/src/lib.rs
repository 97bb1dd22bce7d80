//! Asynchronous delivery of lifecycle events.
//!
//! The services push events into an [`EventQueue`], which never blocks: the
//! event either lands in a bounded channel or is dropped and counted. An
//! [`EventWorker`] task drains the channel into an [`EventHandler`], so a
//! slow or failing handler only ever affects the worker.
//!
//! ```rust,no_run
//! use tether_events::{EventQueue, TracingHandler};
//!
//! # async fn example() {
//! let (queue, worker) = EventQueue::spawn(1024, TracingHandler);
//! // hand `queue` (or clones of it) to the services ...
//! drop(queue);
//! worker.join().await;
//! # }
//! ```

pub mod handler;
pub mod queue;

pub use handler::{EventHandler, OpCounters, TracingHandler};
pub use queue::{EventQueue, EventWorker, QueueStats, DEFAULT_CAPACITY};
