use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::cache::{Cache, MemoryCache};
use crate::communication::{Submission, Thunk, ThunkMany};
use crate::core::batch_fn::BatchFn;
use crate::core::batcher::Batcher;

const DEFAULT_INPUT_CAPACITY: usize = 1000;
const DEFAULT_WAIT: Duration = Duration::from_millis(16);

/// # Loader
///
/// The facade over the batching machinery: coalesces concurrent point
/// lookups into batch calls against a [`BatchFn`] and memoizes results in a
/// pluggable [`Cache`].
///
/// ## Overview
///
/// [`load`](Loader::load) returns a [`Thunk`] immediately; the actual fetch
/// happens on a background worker once the current batch flushes. A batch
/// flushes when it reaches the configured capacity, or when no new
/// submission has arrived for the configured wait interval. Repeated loads
/// of the same key share one cached thunk, so a key reaches the batch
/// function at most once for the lifetime of the cache entry.
///
/// The loader is a cheap handle: clone it freely and share it across tasks.
/// Configuration happens up front, before the first load:
///
/// ```ignore
/// let loader = Loader::new(UserBatchFn::new(pool))
///     .with_batch_capacity(100)
///     .with_wait(Duration::from_millis(5));
///
/// let user = loader.load(user_id).await.get().await?;
/// ```
pub struct Loader<K, V> {
    batch_fn: Arc<dyn BatchFn<K, V>>,
    cache: Arc<dyn Cache<K, V>>,
    batch_capacity: usize,
    input_capacity: usize,
    wait: Duration,
    clear_cache_on_batch: bool,
    state: Arc<Mutex<BatchState<K, V>>>,
}

/// Mutable loader state: the current batcher and its submission count.
/// Guarded by one mutex so rotation is atomic with the increment that
/// triggers it.
struct BatchState<K, V> {
    current: Option<CurrentBatch<K, V>>,
    count: usize,
    last_submission: Instant,
}

struct CurrentBatch<K, V> {
    batcher: Batcher<K, V>,

    /// Held only so that dropping the batch wakes its rotation timer.
    _timer_stop: Option<oneshot::Sender<()>>,
}

impl<K, V> Clone for Loader<K, V> {
    fn clone(&self) -> Self {
        Self {
            batch_fn: Arc::clone(&self.batch_fn),
            cache: Arc::clone(&self.cache),
            batch_capacity: self.batch_capacity,
            input_capacity: self.input_capacity,
            wait: self.wait,
            clear_cache_on_batch: self.clear_cache_on_batch,
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Loader<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a loader over `batch_fn` with the default configuration: an
    /// unbounded batch size, a 16ms idle flush, and a [`MemoryCache`].
    pub fn new(batch_fn: impl BatchFn<K, V> + 'static) -> Self {
        Self {
            batch_fn: Arc::new(batch_fn),
            cache: Arc::new(MemoryCache::new()),
            batch_capacity: 0,
            input_capacity: DEFAULT_INPUT_CAPACITY,
            wait: DEFAULT_WAIT,
            clear_cache_on_batch: false,
            state: Arc::new(Mutex::new(BatchState {
                current: None,
                count: 0,
                last_submission: Instant::now(),
            })),
        }
    }

    /// Caps one batch at `capacity` keys; `0` means unbounded.
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    /// Sets the buffer size of a batcher's submission channel.
    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity.max(1);
        self
    }

    /// Sets the idle interval after which an accumulating batch flushes.
    /// With a zero wait, only the capacity trigger flushes a batch.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Replaces the default [`MemoryCache`].
    pub fn with_cache(mut self, cache: impl Cache<K, V> + 'static) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    /// Drops every cache entry each time a batch completes, once all of its
    /// results have been dispatched.
    pub fn with_clear_cache_on_batch(mut self) -> Self {
        self.clear_cache_on_batch = true;
        self
    }

    /// Requests `key`, returning a thunk that resolves once the batch
    /// containing the key completes.
    ///
    /// A cache hit returns the existing thunk without touching a batcher. A
    /// miss enqueues the key into the current batch and caches the new
    /// thunk, so concurrent loads of the same key coalesce onto one
    /// submission. `load` itself never waits for the backing store.
    pub async fn load(&self, key: K) -> Thunk<V> {
        let mut state = self.state.lock().await;

        if let Some(cached) = self.cache.get(&key).await {
            return cached;
        }

        let (reply, receiver) = oneshot::channel();
        let thunk = Thunk::pending(receiver);
        self.cache.set(key.clone(), thunk.clone()).await;

        let current = state.current.get_or_insert_with(|| self.start_batch());
        current.batcher.submit(Submission::new(key, reply)).await;
        state.count += 1;
        state.last_submission = Instant::now();

        if self.batch_capacity > 0 && state.count == self.batch_capacity {
            rotate(&mut state, &self.cache, self.clear_cache_on_batch);
        }

        thunk
    }

    /// Requests every key in order and wraps the resulting thunks in a
    /// single [`ThunkMany`] handle.
    pub async fn load_many(&self, keys: impl IntoIterator<Item = K>) -> ThunkMany<V> {
        let mut children = Vec::new();
        for key in keys {
            children.push(self.load(key).await);
        }
        ThunkMany::new(children)
    }

    /// Caches `value` under `key` unless the key is already cached. Primes
    /// never overwrite an existing entry; [`clear`](Loader::clear) first to
    /// replace one.
    pub async fn prime(&self, key: K, value: V) -> &Self {
        let _state = self.state.lock().await;
        if self.cache.get(&key).await.is_none() {
            self.cache.set(key, Thunk::resolved(Ok(value))).await;
        }
        self
    }

    /// Removes `key` from the cache, so the next load re-fetches it.
    pub async fn clear(&self, key: &K) -> &Self {
        let _state = self.state.lock().await;
        self.cache.delete(key).await;
        self
    }

    /// Drops every cache entry. Batches already in flight are unaffected.
    pub async fn clear_all(&self) -> &Self {
        let _state = self.state.lock().await;
        self.cache.clear().await;
        self
    }

    /// Spawns the worker for a new batch and, unless `wait` is zero, the
    /// rotation timer that will flush it on idleness.
    fn start_batch(&self) -> CurrentBatch<K, V> {
        let batcher = Batcher::spawn(Arc::clone(&self.batch_fn), self.input_capacity);

        let timer_stop = (self.wait > Duration::ZERO).then(|| {
            let (stop, stopped) = oneshot::channel();
            let timer = RotationTimer {
                state: Arc::clone(&self.state),
                cache: Arc::clone(&self.cache),
                clear_cache_on_batch: self.clear_cache_on_batch,
                wait: self.wait,
                batch: batcher.id(),
            };
            tokio::spawn(timer.run(stopped));
            stop
        });

        CurrentBatch {
            batcher,
            _timer_stop: timer_stop,
        }
    }
}

/// Detaches the current batcher, which closes its input channel and thereby
/// flushes it, and resets the submission count. Must run under the loader
/// state lock.
///
/// With `clear_cache_on_batch`, the cache is cleared only once the detached
/// batch signals completion. Until then the cached thunks keep coalescing
/// loads issued while the batch is in flight.
fn rotate<K, V>(
    state: &mut BatchState<K, V>,
    cache: &Arc<dyn Cache<K, V>>,
    clear_cache_on_batch: bool,
) where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    state.count = 0;
    let Some(current) = state.current.take() else {
        return;
    };

    if clear_cache_on_batch {
        let finished = current.batcher.into_finished();
        let cache = Arc::clone(cache);
        tokio::spawn(async move {
            // Resolves when the worker closes the signal, after every reply
            // has been dispatched.
            let _ = finished.await;
            cache.clear().await;
        });
    }
}

/// Per-batch idle timer. Sleeps toward `last_submission + wait` and rotates
/// the batch once it has been idle for a full wait interval; every new
/// submission pushes the deadline out. Stops silently when the capacity
/// trigger rotates the batch first.
struct RotationTimer<K, V> {
    state: Arc<Mutex<BatchState<K, V>>>,
    cache: Arc<dyn Cache<K, V>>,
    clear_cache_on_batch: bool,
    wait: Duration,
    batch: Uuid,
}

impl<K, V> RotationTimer<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn run(self, mut stopped: oneshot::Receiver<()>) {
        let mut deadline = Instant::now() + self.wait;
        loop {
            tokio::select! {
                // The sender half lives in the loader state; it is dropped
                // the moment this batch stops being current.
                _ = &mut stopped => return,
                _ = time::sleep_until(deadline) => {}
            }

            let mut state = self.state.lock().await;
            let still_current = state
                .current
                .as_ref()
                .is_some_and(|current| current.batcher.id() == self.batch);
            if !still_current {
                return;
            }

            let idle_deadline = state.last_submission + self.wait;
            if Instant::now() >= idle_deadline {
                rotate(&mut state, &self.cache, self.clear_cache_on_batch);
                return;
            }
            deadline = idle_deadline;
        }
    }
}
