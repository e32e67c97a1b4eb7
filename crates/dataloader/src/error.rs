use std::sync::Arc;

use thiserror::Error;

use crate::core::batch_fn::BatchError;

/// Errors synthesized by the loader itself, as opposed to errors the batch
/// function reports for individual keys.
///
/// Every variant is delivered through the same per-key reply channels as
/// ordinary results, so a misbehaving batch function degrades into per-key
/// errors instead of hanging or crashing its callers.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The batch function panicked. Every key in the affected batch observes
    /// this error.
    #[error("Panic received in batch function: {0}")]
    Panic(String),

    /// The batch function returned fewer results than it was given keys.
    /// Every key in the affected batch observes this error.
    #[error("bad batch function. input keys: {keys}, output results: {results}")]
    BadBatchFn { keys: usize, results: usize },

    /// The batch worker went away without delivering a result. Not reachable
    /// through the public API in normal operation; it surfaces when the
    /// runtime is torn down underneath an in-flight batch.
    #[error("batch worker dropped the reply channel")]
    ReplyDropped,
}

impl LoadError {
    /// Wraps the error so one instance can fan out to every thunk in a batch.
    pub(crate) fn shared(self) -> BatchError {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_is_stable() {
        let err = LoadError::Panic("Programming error".to_string());
        assert_eq!(
            err.to_string(),
            "Panic received in batch function: Programming error"
        );
    }

    #[test]
    fn bad_batch_fn_message_is_stable() {
        let err = LoadError::BadBatchFn {
            keys: 10,
            results: 9,
        };
        assert_eq!(
            err.to_string(),
            "bad batch function. input keys: 10, output results: 9"
        );
    }
}
