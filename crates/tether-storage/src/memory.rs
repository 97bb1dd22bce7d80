use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tether_core::{Binding, BindingReader, BindingStore, ShortId, StorageError, StorageResult};
use tracing::trace;

/// In-memory implementation of the store traits using DashMap.
///
/// Every operation holds the shard lock of its key for its whole duration,
/// so the counter increment in [`get`](BindingReader::get) and the
/// check-and-set in [`insert`](BindingStore::insert) are atomic per key.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    storage: DashMap<String, Binding>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl BindingReader for InMemoryStore {
    async fn get(&self, id: &ShortId) -> StorageResult<Binding> {
        let Some(mut entry) = self.storage.get_mut(id.as_str()) else {
            return Err(StorageError::NotFound(id.to_string()));
        };
        entry.counter = entry.counter.saturating_add(1);
        trace!(id = %id, counter = entry.counter, "counted read");
        Ok(entry.clone())
    }

    async fn peek(&self, id: &ShortId) -> StorageResult<Binding> {
        self.storage
            .get(id.as_str())
            .map(|entry| entry.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl BindingStore for InMemoryStore {
    async fn insert(&self, binding: Binding) -> StorageResult<()> {
        match self.storage.entry(binding.id.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateId(binding.id.into_inner())),
            Entry::Vacant(vacant) => {
                vacant.insert(binding);
                Ok(())
            }
        }
    }

    async fn upsert(&self, mut binding: Binding) -> StorageResult<()> {
        match self.storage.entry(binding.id.as_str().to_owned()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                binding.bound_at = existing.bound_at;
                binding.counter = existing.counter;
                *existing = binding;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(binding);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &ShortId) -> StorageResult<()> {
        self.storage
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::Arc;

    fn id(s: &str) -> ShortId {
        ShortId::new_unchecked(s)
    }

    fn binding(code: &str, url: &str) -> Binding {
        Binding {
            id: id(code),
            url: url.to_string(),
            bound_at: Timestamp::from_second(1_700_000_000).unwrap(),
            expire_at: None,
            max_access: None,
            counter: 0,
            expired_url: None,
            exhausted_url: None,
        }
    }

    #[tokio::test]
    async fn insert_and_peek() {
        let store = InMemoryStore::new();
        store
            .insert(binding("abc123", "https://example.com"))
            .await
            .unwrap();

        let got = store.peek(&id("abc123")).await.unwrap();
        assert_eq!(got, binding("abc123", "https://example.com"));
    }

    #[tokio::test]
    async fn insert_conflict() {
        let store = InMemoryStore::new();
        store
            .insert(binding("abc123", "https://example.com"))
            .await
            .unwrap();

        let err = store
            .insert(binding("abc123", "https://other.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::DuplicateId("abc123".to_string()));

        let got = store.peek(&id("abc123")).await.unwrap();
        assert_eq!(got.url, "https://example.com");
    }

    #[tokio::test]
    async fn get_increments_and_peek_does_not() {
        let store = InMemoryStore::new();
        store
            .insert(binding("abc123", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(store.get(&id("abc123")).await.unwrap().counter, 1);
        assert_eq!(store.get(&id("abc123")).await.unwrap().counter, 2);
        assert_eq!(store.peek(&id("abc123")).await.unwrap().counter, 2);
        assert_eq!(store.peek(&id("abc123")).await.unwrap().counter, 2);
    }

    #[tokio::test]
    async fn upsert_creates() {
        let store = InMemoryStore::new();
        store
            .upsert(binding("abc123", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(
            store.peek(&id("abc123")).await.unwrap().url,
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn upsert_replaces_policy_but_keeps_bound_at_and_counter() {
        let store = InMemoryStore::new();
        let original = binding("abc123", "https://example.com");
        store.insert(original.clone()).await.unwrap();
        store.get(&id("abc123")).await.unwrap();

        let mut update = binding("abc123", "https://new.example.com");
        update.bound_at = original.bound_at + SignedDuration::from_hours(5);
        update.max_access = Some(10);
        update.expired_url = Some("https://example.com/gone".to_string());
        store.upsert(update).await.unwrap();

        let got = store.peek(&id("abc123")).await.unwrap();
        assert_eq!(got.url, "https://new.example.com");
        assert_eq!(got.max_access, Some(10));
        assert_eq!(got.expired_url.as_deref(), Some("https://example.com/gone"));
        assert_eq!(got.bound_at, original.bound_at);
        assert_eq!(got.counter, 1);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = InMemoryStore::new();

        let missing = StorageError::NotFound("nope".to_string());
        assert_eq!(store.get(&id("nope")).await.unwrap_err(), missing);
        assert_eq!(store.peek(&id("nope")).await.unwrap_err(), missing);
        assert_eq!(store.delete(&id("nope")).await.unwrap_err(), missing);
    }

    #[tokio::test]
    async fn delete_resets_everything() {
        let store = InMemoryStore::new();
        store
            .insert(binding("abc123", "https://example.com"))
            .await
            .unwrap();
        store.get(&id("abc123")).await.unwrap();

        store.delete(&id("abc123")).await.unwrap();
        assert!(store.is_empty());

        store
            .insert(binding("abc123", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(store.peek(&id("abc123")).await.unwrap().counter, 0);
    }

    #[tokio::test]
    async fn concurrent_gets_are_all_counted() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert(binding("hot", "https://example.com"))
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.get(&id("hot")).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.peek(&id("hot")).await.unwrap().counter, 50);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_id_admit_exactly_one() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = vec![];
        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert(binding("same", &format!("https://example{i}.com")))
                    .await
                    .is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(store.len(), 1);
    }
}
