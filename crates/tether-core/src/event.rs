use crate::error::Error;
use crate::short_id::ShortId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

/// What happened to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    /// Created or updated.
    Insert,
    /// Read while active.
    Get,
    Delete,
    /// Read after its expiration date.
    Expired,
    /// Read after its request limit.
    Exhausted,
}

impl Opcode {
    pub const ALL: [Opcode; 5] = [
        Opcode::Insert,
        Opcode::Get,
        Opcode::Delete,
        Opcode::Expired,
        Opcode::Exhausted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Insert => "insert",
            Opcode::Get => "get",
            Opcode::Delete => "delete",
            Opcode::Expired => "expired",
            Opcode::Exhausted => "exhausted",
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observation of a binding operation. Never read back by the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub id: ShortId,
    pub opcode: Opcode,
    pub error: Option<Error>,
}

impl LifecycleEvent {
    pub fn new(id: ShortId, opcode: Opcode) -> Self {
        Self {
            id,
            opcode,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Error) -> Self {
        self.error = Some(error);
        self
    }
}

/// Receives lifecycle events.
///
/// `push` is called on the request path, so implementations must not block
/// and must not fail: whatever happens to the event afterwards is invisible
/// to the operation that produced it.
pub trait EventSink: Send + Sync + 'static {
    fn push(&self, event: LifecycleEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn push(&self, event: LifecycleEvent) {
        (**self).push(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn push(&self, _event: LifecycleEvent) {}
}
