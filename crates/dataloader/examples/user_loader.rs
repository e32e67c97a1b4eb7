//! Coalesces concurrent user lookups against a simulated slow store.
//!
//! Run with: cargo run --example user_loader

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use dataloader::{BatchError, BatchFn, BatchResult, Loader};

/// A pretend user database with a per-query round-trip cost.
struct UserStore {
    users: HashMap<u64, String>,
    queries: AtomicUsize,
}

impl UserStore {
    fn new() -> Self {
        let users = (1..=8_u64)
            .map(|id| (id, format!("user-{id}")))
            .collect();
        Self {
            users,
            queries: AtomicUsize::new(0),
        }
    }
}

struct UserBatchFn {
    store: Arc<UserStore>,
}

#[derive(Debug)]
struct UserNotFound(u64);

impl std::fmt::Display for UserNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no user with id {}", self.0)
    }
}

impl std::error::Error for UserNotFound {}

#[async_trait]
impl BatchFn<u64, String> for UserBatchFn {
    async fn load(&self, keys: &[u64]) -> Vec<BatchResult<String>> {
        self.store.queries.fetch_add(1, Ordering::Relaxed);
        println!("querying store for {keys:?}");

        // One round trip for the whole batch.
        tokio::time::sleep(Duration::from_millis(30)).await;

        keys.iter()
            .map(|id| match self.store.users.get(id) {
                Some(name) => Ok(name.clone()),
                None => Err(Arc::new(UserNotFound(*id)) as BatchError),
            })
            .collect()
    }
}

#[tokio::main]
async fn main() {
    let store = Arc::new(UserStore::new());
    let loader = Loader::new(UserBatchFn {
        store: store.clone(),
    })
    .with_batch_capacity(16);

    // Six concurrent lookups: four distinct hits, one repeat, one miss.
    let mut handles = Vec::new();
    for id in [1, 2, 3, 4, 1, 99] {
        let loader = loader.clone();
        handles.push(tokio::spawn(async move {
            let thunk = loader.load(id).await;
            (id, thunk.get().await)
        }));
    }

    for handle in handles {
        let (id, result) = handle.await.expect("lookup task");
        match result {
            Ok(name) => println!("{id} -> {name}"),
            Err(err) => println!("{id} -> error: {err}"),
        }
    }

    println!(
        "store queried {} time(s) for 6 lookups",
        store.queries.load(Ordering::Relaxed)
    );
}
