use std::sync::Arc;

use tether_core::{
    evaluate, Binding, BindingReader, BindingSettings, Clock, EventSink, Redirect, Result, ShortId,
    SystemClock,
};
use tracing::{debug, trace};

/// Service for handling URL redirects.
///
/// Uses a read-only store to fetch bindings, counts every resolution and
/// classifies the binding against the clock.
#[derive(Debug, Clone)]
pub struct RedirectorService<R, E, C = SystemClock> {
    reader: Arc<R>,
    events: E,
    settings: Arc<BindingSettings>,
    clock: C,
}

impl<R: BindingReader, E: EventSink> RedirectorService<R, E> {
    pub fn new(reader: R, events: E, settings: BindingSettings) -> Self {
        Self {
            reader: Arc::new(reader),
            events,
            settings: Arc::new(settings),
            clock: SystemClock,
        }
    }
}

impl<R: BindingReader, E: EventSink, C: Clock> RedirectorService<R, E, C> {
    /// Replaces the clock lifecycle checks compare against.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RedirectorService<R, E, C2> {
        RedirectorService {
            reader: self.reader,
            events: self.events,
            settings: self.settings,
            clock,
        }
    }

    /// Resolves an id to its redirect, counting the access.
    ///
    /// Expired and exhausted bindings still resolve: the returned
    /// [`Redirect`] carries the fallback target (if any) and reports the
    /// matching error through [`Redirect::error`].
    ///
    /// # Returns
    ///
    /// * `Ok(redirect)` - The binding exists; one event is emitted
    /// * `Err(e)` - The store failed, including for unknown ids; nothing is emitted
    pub async fn resolve_redirect(&self, id: &ShortId) -> Result<Redirect> {
        trace!(id = %id, "resolving id");

        let binding = self.reader.get(id).await?;
        let counter = binding.counter;
        let redirect = evaluate(binding, self.clock.now(), &self.settings);

        self.events.push(redirect.event());
        if redirect.is_active() {
            debug!(id = %id, counter, "resolved id");
        } else {
            debug!(
                id = %id,
                counter,
                state = ?redirect.state,
                fallback = redirect.target.as_deref().unwrap_or_default(),
                "resolved id to fallback"
            );
        }
        Ok(redirect)
    }

    /// Returns the stored binding without counting it, classifying it or
    /// emitting anything.
    pub async fn peek(&self, id: &ShortId) -> Result<Binding> {
        Ok(self.reader.peek(id).await?)
    }
}
