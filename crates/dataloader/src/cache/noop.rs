use async_trait::async_trait;

use crate::cache::Cache;
use crate::communication::Thunk;

/// # NoCache
///
/// A cache that stores nothing. Every `get` misses, so every load submits to
/// a batcher, priming has no effect, and duplicate keys within one batch
/// reach the batch function multiple times.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl<K, V> Cache<K, V> for NoCache
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, _key: &K) -> Option<Thunk<V>> {
        None
    }

    async fn set(&self, _key: K, _thunk: Thunk<V>) {}

    async fn delete(&self, _key: &K) -> bool {
        false
    }

    async fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    #[test]
    async fn every_operation_is_a_noop() {
        let cache = NoCache;

        Cache::<&str, String>::set(&cache, "k", Thunk::resolved(Ok("v".to_string()))).await;
        assert!(Cache::<&str, String>::get(&cache, &"k").await.is_none());
        assert!(!Cache::<&str, String>::delete(&cache, &"k").await);
        Cache::<&str, String>::clear(&cache).await;
    }
}
