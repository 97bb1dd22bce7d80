pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use std::sync::Arc;
use tether_core::ShortId;

/// Trait for generating ids for bindings that did not ask for one.
///
/// Implementations are pure generators that don't interact with storage:
/// a collision surfaces as a duplicate-id error from the store's insert and
/// is not retried.
pub trait IdGenerator: Send + Sync + 'static {
    /// Generates an id of `length` characters drawn from `alphabet`.
    fn generate(&self, alphabet: &str, length: usize) -> ShortId;
}

impl<T: IdGenerator + ?Sized> IdGenerator for Arc<T> {
    fn generate(&self, alphabet: &str, length: usize) -> ShortId {
        (**self).generate(alphabet, length)
    }
}
