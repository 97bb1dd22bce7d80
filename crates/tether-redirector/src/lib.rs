//! The read side of the engine: resolves ids to redirect targets, counting
//! each resolution against the binding's usage limit.

pub mod service;

pub use service::RedirectorService;
