use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;

/// A cloneable, type-erased error attributed to a single key.
///
/// Results are memoized and handed to every caller that requested the key,
/// so errors travel behind an `Arc` rather than by value.
pub type BatchError = Arc<dyn Error + Send + Sync>;

/// The outcome of a batch call for one key.
pub type BatchResult<V> = Result<V, BatchError>;

/// # BatchFn
///
/// The user-supplied resolver that fetches a whole batch of keys in one call
/// against the backing store.
///
/// ## Contract
///
/// `load` must return one [`BatchResult`] per input key, in the same order as
/// the key slice it was given. Returning fewer results than keys marks every
/// key in the batch with an error; extra results are ignored.
///
/// The function is always invoked from a background worker, never from the
/// task that called [`Loader::load`](crate::Loader::load). It may panic: the
/// worker captures the panic and converts it into a per-key error, so a
/// panicking implementation can never crash or hang its callers.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync {
    /// Resolves all of `keys` against the backing store.
    async fn load(&self, keys: &[K]) -> Vec<BatchResult<V>>;
}
