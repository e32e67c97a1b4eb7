use std::any::Any;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::communication::Submission;
use crate::core::batch_fn::BatchFn;
use crate::error::LoadError;

/// Handle to one in-flight batch. Owned by the loader while the batch is
/// accumulating; dropping it closes the input channel, which is the worker's
/// signal to flush.
pub(crate) struct Batcher<K, V> {
    id: Uuid,
    input: mpsc::Sender<Submission<K, V>>,
    finished: oneshot::Receiver<()>,
}

impl<K, V> Batcher<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Spawns the background worker for a new batch and returns its handle.
    pub(crate) fn spawn(batch_fn: Arc<dyn BatchFn<K, V>>, input_capacity: usize) -> Self {
        let id = Uuid::new_v4();
        let (input, submissions) = mpsc::channel(input_capacity.max(1));
        let (finished_tx, finished) = oneshot::channel();
        tokio::spawn(run(id, submissions, batch_fn, finished_tx));
        Self {
            id,
            input,
            finished,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueues one submission into this batch.
    pub(crate) async fn submit(&self, submission: Submission<K, V>) {
        // The input stays open for as long as this handle lives, so a failed
        // send can only mean the runtime is shutting down. Dropping the
        // submission resolves its thunk with a ReplyDropped error.
        let _ = self.input.send(submission).await;
    }

    /// Consumes the handle, closing the input channel, and returns the
    /// signal that resolves once every reply has been dispatched.
    pub(crate) fn into_finished(self) -> oneshot::Receiver<()> {
        self.finished
    }
}

/// One batch, start to finish: accumulate until the input closes, invoke the
/// batch function under panic capture, fan the results out.
async fn run<K, V>(
    id: Uuid,
    mut submissions: mpsc::Receiver<Submission<K, V>>,
    batch_fn: Arc<dyn BatchFn<K, V>>,
    // Dropped when the worker returns, whatever the exit path; closing it is
    // the batch's completion signal.
    _finished: oneshot::Sender<()>,
) where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let mut keys = Vec::new();
    let mut replies = Vec::new();

    while let Some(submission) = submissions.recv().await {
        let (key, reply) = submission.into_parts();
        keys.push(key);
        replies.push(reply);
    }

    if replies.is_empty() {
        return;
    }

    let key_count = keys.len();

    // The call runs in its own task so that a panicking batch function
    // surfaces as a JoinError here instead of unwinding through the worker.
    let call = tokio::spawn(async move { batch_fn.load(&keys).await });
    let results = match call.await {
        Ok(results) => results,
        Err(join_error) if join_error.is_panic() => {
            let message = panic_message(join_error.into_panic());
            tracing::error!(batch_id = %id, panic = %message, "batch function panicked");
            let err = LoadError::Panic(message).shared();
            for reply in replies {
                let _ = reply.send(Err(err.clone()));
            }
            return;
        }
        // Only reachable when the runtime is shutting down; dropping the
        // replies resolves every waiting thunk.
        Err(_) => return,
    };

    if results.len() < key_count {
        tracing::error!(
            batch_id = %id,
            keys = key_count,
            results = results.len(),
            "batch function returned too few results"
        );
        let err = LoadError::BadBatchFn {
            keys: key_count,
            results: results.len(),
        }
        .shared();
        for reply in replies {
            let _ = reply.send(Err(err.clone()));
        }
        return;
    }

    tracing::debug!(batch_id = %id, keys = key_count, "dispatching batch results");

    // Positional fan-out; zip drops any excess results. A closed reply means
    // the caller discarded its thunk, which is not the batch's problem.
    for (reply, result) in replies.into_iter().zip(results) {
        let _ = reply.send(result);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch_fn::BatchResult;
    use async_trait::async_trait;
    use tokio::sync::oneshot;
    use tokio::test;

    struct Identity;

    #[async_trait]
    impl BatchFn<String, String> for Identity {
        async fn load(&self, keys: &[String]) -> Vec<BatchResult<String>> {
            keys.iter().cloned().map(Ok).collect()
        }
    }

    struct DropsLastResult;

    #[async_trait]
    impl BatchFn<String, String> for DropsLastResult {
        async fn load(&self, keys: &[String]) -> Vec<BatchResult<String>> {
            keys.iter().take(keys.len() - 1).cloned().map(Ok).collect()
        }
    }

    struct Panics;

    #[async_trait]
    impl BatchFn<String, String> for Panics {
        async fn load(&self, _keys: &[String]) -> Vec<BatchResult<String>> {
            panic!("Programming error")
        }
    }

    async fn submit(batcher: &Batcher<String, String>, key: &str) -> oneshot::Receiver<BatchResult<String>> {
        let (tx, rx) = oneshot::channel();
        batcher.submit(Submission::new(key.to_string(), tx)).await;
        rx
    }

    #[test]
    async fn flushes_when_the_handle_is_dropped() {
        let batcher = Batcher::spawn(Arc::new(Identity), 16);
        let first = submit(&batcher, "1").await;
        let second = submit(&batcher, "2").await;

        drop(batcher);

        assert_eq!(first.await.unwrap().unwrap(), "1");
        assert_eq!(second.await.unwrap().unwrap(), "2");
    }

    #[test]
    async fn short_result_set_errors_every_key() {
        let batcher = Batcher::spawn(Arc::new(DropsLastResult), 16);
        let first = submit(&batcher, "1").await;
        let second = submit(&batcher, "2").await;

        drop(batcher);

        let expected = "bad batch function. input keys: 2, output results: 1";
        assert_eq!(first.await.unwrap().unwrap_err().to_string(), expected);
        assert_eq!(second.await.unwrap().unwrap_err().to_string(), expected);
    }

    #[test]
    async fn panic_becomes_a_per_key_error() {
        let batcher = Batcher::spawn(Arc::new(Panics), 16);
        let reply = submit(&batcher, "1").await;

        drop(batcher);

        let err = reply.await.unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Panic received in batch function: Programming error"
        );
    }

    #[test]
    async fn panic_message_downcasts_both_string_kinds() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(17_u32)), "unknown panic payload");
    }
}
