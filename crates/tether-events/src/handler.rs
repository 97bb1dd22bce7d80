use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tether_core::{EventSink, LifecycleEvent, Opcode};
use tracing::{debug, info};

/// Consumes events drained by an [`EventWorker`][crate::EventWorker].
///
/// Errors are logged and counted by the worker; they never reach the
/// operation that produced the event.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(&self, event: &LifecycleEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: EventHandler + ?Sized> EventHandler for Arc<T> {
    async fn handle(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        (**self).handle(event).await
    }
}

/// Writes every event to the `tether::events` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

#[async_trait]
impl EventHandler for TracingHandler {
    async fn handle(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        match &event.error {
            Some(error) => info!(
                target: "tether::events",
                id = %event.id,
                opcode = %event.opcode,
                error = %error,
                "binding event"
            ),
            None => debug!(
                target: "tether::events",
                id = %event.id,
                opcode = %event.opcode,
                "binding event"
            ),
        }
        Ok(())
    }
}

/// Per-opcode event counts. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct OpCounters {
    counts: Arc<[AtomicU64; Opcode::ALL.len()]>,
}

impl OpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[slot(opcode)].load(Ordering::Relaxed)
    }

    /// Sum over every opcode.
    pub fn total(&self) -> u64 {
        Opcode::ALL.iter().map(|opcode| self.count(*opcode)).sum()
    }

    fn record(&self, opcode: Opcode) {
        self.counts[slot(opcode)].fetch_add(1, Ordering::Relaxed);
    }

    /// All counts, in [`Opcode::ALL`] order.
    pub fn snapshot(&self) -> Vec<(Opcode, u64)> {
        Opcode::ALL
            .iter()
            .map(|opcode| (*opcode, self.count(*opcode)))
            .collect()
    }
}

fn slot(opcode: Opcode) -> usize {
    match opcode {
        Opcode::Insert => 0,
        Opcode::Get => 1,
        Opcode::Delete => 2,
        Opcode::Expired => 3,
        Opcode::Exhausted => 4,
    }
}

#[async_trait]
impl EventHandler for OpCounters {
    async fn handle(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        self.record(event.opcode);
        Ok(())
    }
}

/// Counting never blocks, so the counters can also sit directly on the
/// request path without a queue in between.
impl EventSink for OpCounters {
    fn push(&self, event: LifecycleEvent) {
        self.record(event.opcode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{Error, ShortId};

    fn event(opcode: Opcode) -> LifecycleEvent {
        LifecycleEvent::new(ShortId::new_unchecked("abc123"), opcode)
    }

    #[tokio::test]
    async fn counters_track_each_opcode() {
        let counters = OpCounters::new();
        let shared = counters.clone();

        for opcode in [Opcode::Insert, Opcode::Get, Opcode::Get, Opcode::Exhausted] {
            shared.handle(&event(opcode)).await.unwrap();
        }

        assert_eq!(counters.count(Opcode::Insert), 1);
        assert_eq!(counters.count(Opcode::Get), 2);
        assert_eq!(counters.count(Opcode::Delete), 0);
        assert_eq!(counters.count(Opcode::Exhausted), 1);
        assert_eq!(
            counters.snapshot(),
            vec![
                (Opcode::Insert, 1),
                (Opcode::Get, 2),
                (Opcode::Delete, 0),
                (Opcode::Expired, 0),
                (Opcode::Exhausted, 1),
            ]
        );
    }

    #[test]
    fn counters_work_as_a_sink() {
        let counters = OpCounters::new();
        counters.push(event(Opcode::Delete));
        counters.push(event(Opcode::Delete));

        assert_eq!(counters.count(Opcode::Delete), 2);
        assert_eq!(counters.total(), 2);
    }

    #[tokio::test]
    async fn tracing_handler_accepts_everything() {
        TracingHandler.handle(&event(Opcode::Get)).await.unwrap();
        TracingHandler
            .handle(&event(Opcode::Expired).with_error(Error::UrlExpired))
            .await
            .unwrap();
    }
}
