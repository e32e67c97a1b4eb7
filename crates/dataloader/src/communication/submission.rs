use tokio::sync::oneshot;

use crate::core::batch_fn::BatchResult;

/// # Submission
///
/// A container pairing one requested key with the channel its result will be
/// delivered on.
///
/// Every cache miss produces exactly one `Submission`, enqueued into the
/// current batcher. The reply side is a oneshot sender: the batcher sends a
/// single [`BatchResult`] and the channel closes, which is what wakes the
/// thunk held by the original caller.
///
/// ## Type Parameters
///
/// * `K` - The key type being looked up
/// * `V` - The value type produced by the batch function
pub(crate) struct Submission<K, V> {
    /// The key to resolve in this batch
    key: K,

    /// Channel for sending the key's result back to the requester
    reply: oneshot::Sender<BatchResult<V>>,
}

impl<K, V> Submission<K, V> {
    /// Creates a new `Submission` from a key and the sending half of its
    /// reply channel.
    pub(crate) fn new(key: K, reply: oneshot::Sender<BatchResult<V>>) -> Self {
        Self { key, reply }
    }

    /// Splits the submission back into its key and reply sender, consuming
    /// it. The batcher uses this when it takes ownership of both sides at
    /// flush time.
    pub(crate) fn into_parts(self) -> (K, oneshot::Sender<BatchResult<V>>) {
        (self.key, self.reply)
    }
}
