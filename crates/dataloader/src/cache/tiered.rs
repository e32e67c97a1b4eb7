use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{Cache, MemoryCache};
use crate::communication::Thunk;

/// # TieredCache
///
/// A two-tier cache: a [`MemoryCache`] primary in front of an opaque
/// secondary store, typically one with its own eviction or TTL policy.
///
/// Reads check the primary first and promote secondary hits into it.
/// Writes, deletes, and clears go to both tiers, so the primary can never
/// outlive the secondary's view of an entry.
pub struct TieredCache<K, V> {
    primary: MemoryCache<K, V>,
    secondary: Arc<dyn Cache<K, V>>,
}

impl<K, V> TieredCache<K, V> {
    pub fn new(secondary: Arc<dyn Cache<K, V>>) -> Self {
        Self {
            primary: MemoryCache::new(),
            secondary,
        }
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for TieredCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<Thunk<V>> {
        if let Some(hit) = self.primary.get(key).await {
            return Some(hit);
        }
        let hit = self.secondary.get(key).await?;
        self.primary.set(key.clone(), hit.clone()).await;
        Some(hit)
    }

    async fn set(&self, key: K, thunk: Thunk<V>) {
        self.secondary.set(key.clone(), thunk.clone()).await;
        self.primary.set(key, thunk).await;
    }

    async fn delete(&self, key: &K) -> bool {
        let primary = self.primary.delete(key).await;
        let secondary = self.secondary.delete(key).await;
        primary || secondary
    }

    async fn clear(&self) {
        self.primary.clear().await;
        self.secondary.clear().await;
    }
}
