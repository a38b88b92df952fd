//! Per-key single-flight for cache misses.
//!
//! Concurrent callers that miss on the same key share one in-flight fetch and
//! its result. The slot is removed once the fetch settles, so the next miss
//! after that starts a fresh fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::warn;

use crate::data_source::SourceError;

type Slot<T> = Arc<OnceCell<Result<T, SourceError>>>;

#[derive(Debug)]
pub struct SingleFlight<T> {
    in_flight: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fetch` unless a fetch for `key` is already running, in which case
    /// the caller waits for that one and receives a clone of its result.
    ///
    /// If the leading caller is cancelled, a waiting caller takes over and runs
    /// its own `fetch`.
    pub async fn run<F, Fut>(&self, key: &str, fetch: F) -> Result<T, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let Some(slot) = self.slot(key) else {
            return fetch().await;
        };

        let result = slot.get_or_init(fetch).await.clone();
        self.release(key, &slot);
        result
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn slot(&self, key: &str) -> Option<Slot<T>> {
        match self.in_flight.lock() {
            Ok(mut map) => Some(Arc::clone(
                map.entry(key.to_owned())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )),
            Err(_) => {
                warn!(key, "single-flight map poisoned; fetching without coalescing");
                None
            }
        }
    }

    fn release(&self, key: &str, slot: &Slot<T>) {
        if let Ok(mut map) = self.in_flight.lock() {
            if map.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
                map.remove(key);
            }
        }
    }
}
