use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::OnceCell;

use crate::communication::thunk::Thunk;
use crate::core::batch_fn::{BatchError, BatchResult};

/// # ThunkMany
///
/// A lazy, memoizing handle over an ordered collection of [`Thunk`]s, as
/// returned by [`Loader::load_many`](crate::Loader::load_many).
///
/// The first call to [`get`](ThunkMany::get) resolves every child thunk
/// concurrently, waits for all of them, and stores the gathered
/// [`ManyResult`]. Later calls return a clone of the stored result. Like
/// [`Thunk`], it is cheap to clone and safe to resolve from arbitrary tasks.
pub struct ThunkMany<V> {
    inner: Arc<ThunkManyInner<V>>,
}

struct ThunkManyInner<V> {
    children: Vec<Thunk<V>>,
    outcome: OnceCell<ManyResult<V>>,
}

impl<V> Clone for ThunkMany<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> ThunkMany<V> {
    pub(crate) fn new(children: Vec<Thunk<V>>) -> Self {
        Self {
            inner: Arc::new(ThunkManyInner {
                children,
                outcome: OnceCell::new(),
            }),
        }
    }

    /// Resolves every child thunk concurrently and gathers their outcomes,
    /// preserving input order. Memoized after the first call.
    pub async fn get(&self) -> ManyResult<V> {
        self.inner
            .outcome
            .get_or_init(|| async {
                let results =
                    join_all(self.inner.children.iter().map(|child| child.get())).await;
                ManyResult::gather(results)
            })
            .await
            .clone()
    }
}

/// The gathered outcome of a [`ThunkMany`] resolution.
///
/// `values` always has one slot per requested key, in request order, with
/// `None` in slots whose key errored. `errors` is `None` when every key
/// succeeded; otherwise it also has one slot per key, with `None` in the
/// slots that succeeded.
#[derive(Debug, Clone)]
pub struct ManyResult<V> {
    values: Vec<Option<V>>,
    errors: Option<Vec<Option<BatchError>>>,
}

impl<V> ManyResult<V> {
    fn gather(results: Vec<BatchResult<V>>) -> Self {
        let mut values = Vec::with_capacity(results.len());
        let mut errors = Vec::with_capacity(results.len());
        let mut failed = false;

        for result in results {
            match result {
                Ok(value) => {
                    values.push(Some(value));
                    errors.push(None);
                }
                Err(err) => {
                    failed = true;
                    values.push(None);
                    errors.push(Some(err));
                }
            }
        }

        Self {
            values,
            errors: failed.then_some(errors),
        }
    }

    /// Per-key values in request order; errored slots are `None`.
    pub fn values(&self) -> &[Option<V>] {
        &self.values
    }

    /// Per-key errors in request order, or `None` if every key succeeded.
    pub fn errors(&self) -> Option<&[Option<BatchError>]> {
        self.errors.as_deref()
    }

    /// Number of requested keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use tokio::test;

    #[test]
    async fn gathers_values_in_order() {
        let thunks = vec![
            Thunk::resolved(Ok("a".to_string())),
            Thunk::resolved(Ok("b".to_string())),
            Thunk::resolved(Ok("c".to_string())),
        ];

        let result = ThunkMany::new(thunks).get().await;
        assert_eq!(
            result.values(),
            &[
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
        assert!(result.errors().is_none());
    }

    #[test]
    async fn error_slice_matches_key_count() {
        let thunks = vec![
            Thunk::resolved(Err(LoadError::Panic("boom".to_string()).shared())),
            Thunk::resolved(Ok("b".to_string())),
        ];

        let result = ThunkMany::new(thunks).get().await;
        let errors = result.errors().expect("one key errored");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].is_some());
        assert!(errors[1].is_none());
        assert_eq!(result.values()[0], None);
        assert_eq!(result.values()[1], Some("b".to_string()));
    }

    #[test]
    async fn empty_input_yields_empty_result() {
        let result = ThunkMany::<String>::new(vec![]).get().await;
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.errors().is_none());
    }
}
