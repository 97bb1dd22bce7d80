use crate::binding::Binding;
use crate::error::StorageResult;
use crate::short_id::ShortId;
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to stored bindings.
///
/// The two reads differ only in side effects: [`get`](Self::get) counts as
/// an access, [`peek`](Self::peek) does not.
#[async_trait]
pub trait BindingReader: Send + Sync + 'static {
    /// Atomically increments the access counter and returns the binding as
    /// it is after the increment.
    ///
    /// Returns `Err(NotFound)` if the id is unknown.
    async fn get(&self, id: &ShortId) -> StorageResult<Binding>;

    /// Returns the stored binding without touching the counter.
    ///
    /// Returns `Err(NotFound)` if the id is unknown.
    async fn peek(&self, id: &ShortId) -> StorageResult<Binding>;
}

#[async_trait]
pub trait BindingStore: BindingReader {
    /// Stores a new binding. Returns `Err(DuplicateId)` if the id is taken.
    async fn insert(&self, binding: Binding) -> StorageResult<()>;

    /// Creates the binding, or replaces the policy of an existing one.
    ///
    /// Replacing keeps the stored `bound_at` and `counter`; everything else
    /// comes from `binding`. Never fails because the id already exists.
    async fn upsert(&self, binding: Binding) -> StorageResult<()>;

    /// Removes a binding. Returns `Err(NotFound)` if the id is unknown.
    async fn delete(&self, id: &ShortId) -> StorageResult<()>;
}

#[async_trait]
impl<T: BindingReader + ?Sized> BindingReader for Arc<T> {
    async fn get(&self, id: &ShortId) -> StorageResult<Binding> {
        (**self).get(id).await
    }

    async fn peek(&self, id: &ShortId) -> StorageResult<Binding> {
        (**self).peek(id).await
    }
}

#[async_trait]
impl<T: BindingStore + ?Sized> BindingStore for Arc<T> {
    async fn insert(&self, binding: Binding) -> StorageResult<()> {
        (**self).insert(binding).await
    }

    async fn upsert(&self, binding: Binding) -> StorageResult<()> {
        (**self).upsert(binding).await
    }

    async fn delete(&self, id: &ShortId) -> StorageResult<()> {
        (**self).delete(id).await
    }
}
