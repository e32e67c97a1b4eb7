//! # Dataloader
//!
//! A request coalescing and caching layer that sits between concurrent
//! callers and a slow backing store, typically a database or a remote
//! service.
//!
//! ## Overview
//!
//! Many callers issue point lookups by key within a short window. The
//! loader collects these into one batch call against a user-supplied
//! [`BatchFn`], amortizing round-trip cost, and memoizes each key's result
//! so that repeated requests resolve without redundant backend work.
//!
//! Key components include:
//!
//! - A [`Loader`] facade implementing `load`, `load_many`, `prime`, `clear`,
//!   and `clear_all`
//! - A single-use background batcher per in-flight batch, with panic capture
//!   around the batch function
//! - [`Thunk`] handles that block exactly until the batch containing their
//!   key completes
//! - Pluggable [`Cache`] implementations: in-memory, two-tier, and no-op
//!
//! ## Architecture
//!
//! ### Batch accumulation
//!
//! Each cache miss submits a `(key, reply channel)` pair into the current
//! batch. The batch flushes when it reaches the configured capacity or when
//! no submission has arrived for the configured wait interval; both triggers
//! run under one loader mutex, so a submission can never race into a batch
//! that has already committed to flushing.
//!
//! ### Fault containment
//!
//! The batch function is treated as opaque and potentially panicking. A
//! panic, or a result slice shorter than the key slice, degrades into
//! per-key errors delivered through the normal reply channels; callers of
//! [`Thunk::get`] never observe a panic and never hang.
//!
//! ### Caching
//!
//! The cache stores thunks rather than values, so a second load of a key
//! whose batch is still in flight joins the pending result instead of
//! re-fetching. Errors are cached like successes; callers that want a retry
//! clear the key first.
//!
//! ## Usage Example
//!
//! ```ignore
//! use dataloader::{BatchFn, BatchResult, Loader};
//! use async_trait::async_trait;
//!
//! struct UserBatchFn {
//!     pool: PgPool,
//! }
//!
//! #[async_trait]
//! impl BatchFn<UserId, User> for UserBatchFn {
//!     async fn load(&self, keys: &[UserId]) -> Vec<BatchResult<User>> {
//!         // One query for the whole batch, one result per key in order.
//!         fetch_users(&self.pool, keys).await
//!     }
//! }
//!
//! let loader = Loader::new(UserBatchFn { pool }).with_batch_capacity(100);
//!
//! // Concurrent loads coalesce into a single query.
//! let (alice, bob) = tokio::join!(
//!     loader.load(alice_id).await.get(),
//!     loader.load(bob_id).await.get(),
//! );
//! ```

mod cache;
mod communication;
mod core;
mod error;
mod loader;

pub use crate::cache::{Cache, MemoryCache, NoCache, TieredCache};
pub use crate::communication::{ManyResult, Thunk, ThunkMany};
pub use crate::core::batch_fn::{BatchError, BatchFn, BatchResult};
pub use crate::error::LoadError;
pub use crate::loader::Loader;
