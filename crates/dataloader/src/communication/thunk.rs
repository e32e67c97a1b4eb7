use std::sync::Arc;

use tokio::sync::{oneshot, Mutex, OnceCell};

use crate::core::batch_fn::BatchResult;
use crate::error::LoadError;

/// # Thunk
///
/// A lazy, memoizing handle to the result of one key's lookup.
///
/// The first call to [`get`](Thunk::get) blocks until the batch containing
/// the key completes, then stores the outcome. Every later call, from any
/// task, returns a clone of the stored outcome without touching the reply
/// channel again.
///
/// ## Concurrency
///
/// `Thunk` is cheap to clone and safe to resolve from arbitrary tasks.
/// Concurrent first callers park on the same one-shot latch and all observe
/// the identical result; the underlying reply channel is read at most once.
///
/// ## Primed thunks
///
/// A thunk installed by [`Loader::prime`](crate::Loader::prime) is
/// constructed already resolved and never owns a reply channel.
pub struct Thunk<V> {
    inner: Arc<ThunkInner<V>>,
}

struct ThunkInner<V> {
    /// Receiving half of the batch's reply channel. `None` for primed thunks.
    receiver: Mutex<Option<oneshot::Receiver<BatchResult<V>>>>,

    /// One-shot latch holding the memoized outcome.
    outcome: OnceCell<BatchResult<V>>,
}

impl<V> Clone for Thunk<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Thunk<V> {
    /// Creates a thunk that resolves once the batcher sends on `receiver`.
    pub(crate) fn pending(receiver: oneshot::Receiver<BatchResult<V>>) -> Self {
        Self {
            inner: Arc::new(ThunkInner {
                receiver: Mutex::new(Some(receiver)),
                outcome: OnceCell::new(),
            }),
        }
    }

    /// Creates a thunk that is already resolved to `result`.
    pub fn resolved(result: BatchResult<V>) -> Self {
        Self {
            inner: Arc::new(ThunkInner {
                receiver: Mutex::new(None),
                outcome: OnceCell::new_with(Some(result)),
            }),
        }
    }

    /// Resolves the thunk, blocking until its batch has completed.
    ///
    /// All callers, concurrent or sequential, observe the same
    /// [`BatchResult`].
    pub async fn get(&self) -> BatchResult<V> {
        self.inner
            .outcome
            .get_or_init(|| async {
                // The receiver is polled in place rather than taken out, so a
                // caller cancelled mid-resolution leaves it intact for the
                // next caller.
                let mut slot = self.inner.receiver.lock().await;
                match slot.as_mut() {
                    Some(receiver) => match receiver.await {
                        Ok(result) => result,
                        Err(_) => Err(LoadError::ReplyDropped.shared()),
                    },
                    None => Err(LoadError::ReplyDropped.shared()),
                }
            })
            .await
            .clone()
    }
}
