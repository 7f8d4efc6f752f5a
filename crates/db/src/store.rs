//! Keyed storage capability and its in-memory implementation.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An atomic insert found the key already present.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal keyed-store contract the repositories are written against.
///
/// Implementations must make [`insert_if_absent`](KeyValueStore::insert_if_absent)
/// a single atomic check-and-insert.
#[async_trait]
pub trait KeyValueStore<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, DbError>;

    /// Insert or overwrite.
    async fn put(&self, key: K, value: V) -> Result<(), DbError>;

    /// Remove a key. Returns `true` if it was present.
    async fn delete(&self, key: &K) -> Result<bool, DbError>;

    /// Insert only if the key is absent. Returns `false` when it already existed.
    async fn insert_if_absent(&self, key: K, value: V) -> Result<bool, DbError>;

    /// Keep only entries for which `keep` returns `true`. Returns the number removed.
    async fn retain(
        &self,
        keep: &(dyn for<'a> Fn(&'a K, &'a V) -> bool + Send + Sync),
    ) -> Result<usize, DbError>;

    async fn len(&self) -> Result<usize, DbError>;
}

/// `HashMap` behind a `tokio` read-write lock.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> KeyValueStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, DbError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: K, value: V) -> Result<(), DbError> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> Result<bool, DbError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn insert_if_absent(&self, key: K, value: V) -> Result<bool, DbError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, value);
        Ok(true)
    }

    async fn retain(
        &self,
        keep: &(dyn for<'a> Fn(&'a K, &'a V) -> bool + Send + Sync),
    ) -> Result<usize, DbError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, v| keep(k, v));
        Ok(before - entries.len())
    }

    async fn len(&self) -> Result<usize, DbError> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store: MemoryStore<String, u32> = MemoryStore::new();
        store.put("a".into(), 1).await.unwrap();
        assert_eq!(store.get(&"a".to_string()).await.unwrap(), Some(1));

        assert!(store.delete(&"a".to_string()).await.unwrap());
        assert!(!store.delete(&"a".to_string()).await.unwrap());
        assert_eq!(store.get(&"a".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first_value() {
        let store: MemoryStore<&'static str, u32> = MemoryStore::new();
        assert!(store.insert_if_absent("k", 1).await.unwrap());
        assert!(!store.insert_if_absent("k", 2).await.unwrap());
        assert_eq!(store.get(&"k").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn concurrent_inserts_have_one_winner() {
        let store: Arc<MemoryStore<&'static str, usize>> = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert_if_absent("same", i).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn retain_reports_removed() {
        let store: MemoryStore<u32, u32> = MemoryStore::new();
        for i in 0..10 {
            store.put(i, i).await.unwrap();
        }
        let removed = store.retain(&|_, v| v % 2 == 0).await.unwrap();
        assert_eq!(removed, 5);
        assert_eq!(store.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn retain_through_trait_object_with_captured_cutoff() {
        let store: Arc<dyn KeyValueStore<String, i64>> = Arc::new(MemoryStore::new());
        store.put("old".into(), 10).await.unwrap();
        store.put("new".into(), 50).await.unwrap();

        let cutoff = 30;
        let removed = store.retain(&move |_, issued| *issued >= cutoff).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.get(&"new".to_string()).await.unwrap(), Some(50));
        assert_eq!(store.get(&"old".to_string()).await.unwrap(), None);
    }
}
