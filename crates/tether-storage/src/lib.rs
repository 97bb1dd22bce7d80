//! Binding store implementations.
//!
//! [`InMemoryStore`] keeps everything in a sharded map and suits tests and
//! single-process use. [`MySqlStore`] persists bindings in MySQL; its schema
//! lives in `ddl/mysql/bindings.sql`.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;
pub use tether_core::{BindingReader, BindingStore, StorageError, StorageResult};
