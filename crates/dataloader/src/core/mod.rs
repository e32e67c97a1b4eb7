//! # Core batching machinery
//!
//! The core module implements the concurrent batch-accumulation state
//! machine that sits underneath the public [`Loader`](crate::Loader) facade.
//!
//! ## Module Structure
//!
//! * [`batch_fn`] - Defines the [`BatchFn`](batch_fn::BatchFn) trait, the
//!   seam through which the user-supplied resolver is invoked, together with
//!   the per-key result aliases shared across the crate.
//!
//! * [`batcher`] - Implements the single-use background worker that drains
//!   submissions for one batch, invokes the batch function under panic
//!   capture, and fans results out to the waiting thunks.
//!
//! ## Lifecycle
//!
//! A batcher is created lazily by the loader on the first cache miss after a
//! flush and lives for exactly one batch. Closing its input channel is the
//! flush signal; once results are dispatched the worker simply ends. The
//! loader decides *when* to close the input (capacity reached, or the idle
//! rotation timer fired), which keeps that decision atomic with the
//! submission counter it depends on.

pub mod batch_fn;
pub(crate) mod batcher;
