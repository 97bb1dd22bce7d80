use jiff::Timestamp;
use std::sync::Arc;
use tether_core::target::validate_optional_url;
use tether_core::{
    resolve_expiration, resolve_max_access, validate_url, BindRequest, Binding, BindingSettings,
    BindingStore, Clock, Enforcement, EventSink, LifecycleEvent, Opcode, Result, ShortId,
    SystemClock,
};
use tether_generator::IdGenerator;
use tracing::{debug, info, warn};

/// The write side of the engine.
///
/// Wraps a [`BindingStore`], an [`IdGenerator`] and an [`EventSink`]:
/// - requests are validated before anything is persisted
/// - generated ids are inserted, caller-chosen ids are upserted
/// - successful writes and deletes emit one event each
///
/// Note: the generator is responsible for uniqueness. A generated id that
/// already exists fails with the store's duplicate-id error; no retry is
/// performed.
#[derive(Debug, Clone)]
pub struct BinderService<S, G, E, C = SystemClock> {
    store: Arc<S>,
    generator: Arc<G>,
    events: E,
    settings: Arc<BindingSettings>,
    clock: C,
}

enum StoreOp {
    Insert,
    Upsert,
}

impl<S: BindingStore, G: IdGenerator, E: EventSink> BinderService<S, G, E> {
    /// Creates a service reading "now" from the system clock.
    ///
    /// `settings` is taken as is; run [`BindingSettings::validate`] first if
    /// it comes from user input.
    pub fn new(store: S, generator: G, events: E, settings: BindingSettings) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            events,
            settings: Arc::new(settings),
            clock: SystemClock,
        }
    }
}

impl<S: BindingStore, G: IdGenerator, E: EventSink, C: Clock> BinderService<S, G, E, C> {
    /// Replaces the clock used by [`bind_simple`](Self::bind_simple).
    pub fn with_clock<C2: Clock>(self, clock: C2) -> BinderService<S, G, E, C2> {
        BinderService {
            store: self.store,
            generator: self.generator,
            events: self.events,
            settings: self.settings,
            clock,
        }
    }

    /// Binds `request.url` to an id and returns the id.
    ///
    /// An unset or blank id is generated from the configured alphabet and
    /// length and inserted. Any other id is checked against `enforcement`
    /// and upserted, so binding an existing id replaces its target and
    /// policy while keeping its bind time and counter. A TTL on such a
    /// rebind counts from the new `bound_at`, so the stored `expire_at` may
    /// lie further from the stored `bound_at` than the TTL.
    ///
    /// Timestamps are truncated to microseconds, the precision stores keep.
    pub async fn bind(
        &self,
        request: BindRequest,
        enforcement: Enforcement,
        bound_at: Timestamp,
    ) -> Result<ShortId> {
        validate_url(&request.url)?;
        validate_optional_url(request.expired_url.as_deref())?;
        validate_optional_url(request.exhausted_url.as_deref())?;

        let bound_at = truncate_to_micros(bound_at);
        let expire_at = resolve_expiration(
            bound_at,
            &request.expiration_policy(),
            &self.settings.expiration_policy(),
        )?
        .map(truncate_to_micros);
        let max_access = resolve_max_access(request.max_access, self.settings.max_access);

        let requested = ShortId::parse(
            request.id.as_deref().unwrap_or_default(),
            &self.settings.alphabet,
            self.settings.length,
            enforcement,
        )?;
        let (id, op) = match requested {
            Some(id) => (id, StoreOp::Upsert),
            None => {
                let id = self
                    .generator
                    .generate(&self.settings.alphabet, self.settings.length);
                debug!(id = %id, "generated id");
                (id, StoreOp::Insert)
            }
        };

        let binding = Binding {
            id: id.clone(),
            url: request.url,
            bound_at,
            expire_at,
            max_access,
            counter: 0,
            expired_url: request.expired_url.filter(|url| !url.is_empty()),
            exhausted_url: request.exhausted_url.filter(|url| !url.is_empty()),
        };

        let stored = match op {
            StoreOp::Insert => self.store.insert(binding).await,
            StoreOp::Upsert => self.store.upsert(binding).await,
        };
        if let Err(e) = stored {
            warn!(id = %id, error = %e, "failed to store binding");
            return Err(e.into());
        }

        self.events.push(LifecycleEvent::new(id.clone(), Opcode::Insert));
        info!(
            id = %id,
            expire_at = ?expire_at,
            max_access = ?max_access,
            "bound url"
        );
        Ok(id)
    }

    /// [`bind`](Self::bind) with full enforcement, bound now.
    pub async fn bind_simple(&self, request: BindRequest) -> Result<ShortId> {
        self.bind(request, Enforcement::STRICT, self.clock.now()).await
    }

    /// Removes a binding.
    ///
    /// Unknown ids fail with the store's not-found error and emit nothing.
    pub async fn unbind(&self, id: &ShortId) -> Result<()> {
        self.store.delete(id).await?;
        self.events.push(LifecycleEvent::new(id.clone(), Opcode::Delete));
        info!(id = %id, "unbound url");
        Ok(())
    }
}

fn truncate_to_micros(ts: Timestamp) -> Timestamp {
    Timestamp::from_microsecond(ts.as_microsecond()).unwrap_or(ts)
}
