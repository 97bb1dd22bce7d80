//! Core types and traits for the Tether URL binding engine.
//!
//! This crate holds the binding model, the policy resolver, the identifier
//! validator, the read-time lifecycle evaluation and the collaborator traits
//! (store, event sink, clock) shared by the binder and redirector services.

pub mod binding;
pub mod clock;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod policy;
pub mod settings;
pub mod short_id;
pub mod store;
pub mod target;

pub use binding::{BindRequest, Binding};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result, StorageError, StorageResult};
pub use event::{EventSink, LifecycleEvent, NoopSink, Opcode};
pub use lifecycle::{evaluate, LifecycleState, Redirect};
pub use policy::{resolve_expiration, resolve_max_access, ExpirationPolicy};
pub use settings::BindingSettings;
pub use short_id::{Enforcement, ShortId};
pub use store::{BindingReader, BindingStore};
pub use target::validate_url;
