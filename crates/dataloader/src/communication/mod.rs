//! # Communication primitives
//!
//! Rendezvous types between the tasks requesting keys and the background
//! batch worker that resolves them.
//!
//! Each cache miss creates one [`Submission`] (key plus oneshot reply
//! sender) bound for the current batcher, and one [`Thunk`] (the receiving
//! half, wrapped in a memoizing latch) handed back to the caller.
//! [`ThunkMany`] composes a batch of thunks behind a single handle.

mod submission;
mod thunk;
mod thunk_many;

pub(crate) use submission::Submission;
pub use thunk::Thunk;
pub use thunk_many::{ManyResult, ThunkMany};
