//! Query cache for count lookups.
//!
//! Keys are the literal compound query (`"{first} {second}"`), compared
//! byte-for-byte: no case folding, no whitespace normalisation. Entries are
//! never evicted; the cache lives as long as its owner.
//!
//! Concurrent lookups for the same key are single-flight: the first caller
//! performs the fetch, the others await its result. A failed fetch stores
//! nothing, so the next lookup tries again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::eutils::{ESearchResponse, FetchError};

#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<ESearchResponse>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached response for `term`, or run `fetch` once and store its result.
    pub async fn lookup_or_fetch<F, Fut>(&self, term: &str, fetch: F) -> Result<ESearchResponse, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ESearchResponse, FetchError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(term.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(hit) = cell.get() {
            debug!(term = %term, "query cache hit");
            return Ok(hit.clone());
        }

        let value = cell
            .get_or_try_init(|| async move {
                debug!(term = %term, "query cache miss");
                fetch().await
            })
            .await?;
        Ok(value.clone())
    }

    pub async fn get(&self, term: &str) -> Option<ESearchResponse> {
        let entries = self.entries.lock().await;
        entries.get(term).and_then(|cell| cell.get().cloned())
    }

    /// Number of stored responses.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
