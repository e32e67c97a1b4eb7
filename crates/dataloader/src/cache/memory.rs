use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::Cache;
use crate::communication::Thunk;

/// # MemoryCache
///
/// The default cache: a process-local map from key to thunk behind a single
/// mutex. Entries live until deleted or cleared; there is no eviction.
pub struct MemoryCache<K, V> {
    entries: Mutex<HashMap<K, Thunk<V>>>,
}

impl<K, V> MemoryCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<Thunk<V>> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: K, thunk: Thunk<V>) {
        self.entries.lock().await.insert(key, thunk);
    }

    async fn delete(&self, key: &K) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    fn resolved(value: &str) -> Thunk<String> {
        Thunk::resolved(Ok(value.to_string()))
    }

    #[test]
    async fn set_then_get_returns_the_same_thunk() {
        let cache = MemoryCache::new();
        cache.set("k", resolved("v")).await;

        let hit = cache.get(&"k").await.expect("entry present");
        assert_eq!(hit.get().await.unwrap(), "v");
    }

    #[test]
    async fn delete_reports_presence() {
        let cache = MemoryCache::new();
        cache.set("k", resolved("v")).await;

        assert!(cache.delete(&"k").await);
        assert!(!cache.delete(&"k").await);
        assert!(cache.get(&"k").await.is_none());
    }

    #[test]
    async fn clear_drops_every_entry() {
        let cache = MemoryCache::new();
        cache.set("a", resolved("1")).await;
        cache.set("b", resolved("2")).await;

        cache.clear().await;

        assert!(cache.get(&"a").await.is_none());
        assert!(cache.get(&"b").await.is_none());
    }
}
