//! Binding creation, removal and bulk import.
//!
//! [`BinderService`] is the write side of the engine. It validates
//! requests, resolves their effective policy against the global
//! [`BindingSettings`][tether_core::BindingSettings] and persists the result
//! through a [`BindingStore`][tether_core::BindingStore].

pub mod import;
pub mod record;
pub mod service;

pub use import::ImportError;
pub use record::{is_header, parse_record};
pub use service::BinderService;
