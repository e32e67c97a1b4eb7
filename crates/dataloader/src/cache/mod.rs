//! # Cache implementations
//!
//! The loader's cache stores [`Thunk`]s, not values: a cached entry may still
//! be in flight, and a repeated load joins it instead of re-submitting the
//! key. Three interchangeable implementations are provided:
//!
//! * [`MemoryCache`] - mutex-guarded in-memory map, the default
//! * [`TieredCache`] - in-memory primary over an opaque secondary store
//! * [`NoCache`] - disables caching entirely, every load re-batches

mod memory;
mod noop;
mod tiered;

use std::sync::Arc;

use async_trait::async_trait;

use crate::communication::Thunk;

pub use memory::MemoryCache;
pub use noop::NoCache;
pub use tiered::TieredCache;

/// The capability set the loader requires of a cache.
///
/// Implementations are expected to be infallible and internally
/// synchronized; the loader serializes its own mutations but shares the
/// cache with rotation timers running on other tasks.
#[async_trait]
pub trait Cache<K: Send + Sync + 'static, V: Send + Sync + 'static>: Send + Sync {
    /// Looks up the thunk cached under `key`, if any.
    async fn get(&self, key: &K) -> Option<Thunk<V>>;

    /// Caches `thunk` under `key`, replacing any existing entry.
    async fn set(&self, key: K, thunk: Thunk<V>);

    /// Removes `key`, reporting whether an entry was present.
    async fn delete(&self, key: &K) -> bool;

    /// Drops every entry.
    async fn clear(&self);
}

#[async_trait]
impl<K, V, C> Cache<K, V> for Arc<C>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: Cache<K, V> + ?Sized,
{
    async fn get(&self, key: &K) -> Option<Thunk<V>> {
        (**self).get(key).await
    }

    async fn set(&self, key: K, thunk: Thunk<V>) {
        (**self).set(key, thunk).await;
    }

    async fn delete(&self, key: &K) -> bool {
        (**self).delete(key).await
    }

    async fn clear(&self) {
        (**self).clear().await;
    }
}
