//! Aggregation Loop
//!
//! Walks the pair product strictly in order, one count request in flight at a
//! time, pausing a fixed delay between pairs to stay inside the upstream rate
//! limit. After every pair the cumulative result list is handed to the
//! presenter, so partial results stay visible whatever happens later.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};

use super::count::CountFetcher;
use super::presenter::Presenter;
use crate::config::FailurePolicy;
use crate::models::{CountResult, PairFailure, PairOutcome};
use crate::search::generate_pairs;
use crate::types::{AppError, AppResult};

pub const DEFAULT_PAIR_DELAY: Duration = Duration::from_millis(1000);

/// Suspension between pairs. Swappable so tests can observe pacing without waiting.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Cancellation handle for one search action.
#[derive(Clone, Default)]
pub struct SearchToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SearchToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn same_as(&self, other: &SearchToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Hands out search tokens; beginning a new search for a client cancels that
/// client's previous one.
#[derive(Clone, Default)]
pub struct SearchSupervisor {
    active: Arc<Mutex<HashMap<String, SearchToken>>>,
}

impl SearchSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin(&self, client: &str) -> SearchToken {
        let token = SearchToken::new();
        let mut active = self.active.lock().await;
        if let Some(previous) = active.insert(client.to_string(), token.clone()) {
            info!(client = %client, "Superseding running search");
            previous.cancel();
        }
        token
    }

    /// Drop `client`'s entry if it still holds `token`; a newer search keeps its slot.
    pub async fn finish(&self, client: &str, token: &SearchToken) {
        let mut active = self.active.lock().await;
        if active.get(client).is_some_and(|current| current.same_as(token)) {
            active.remove(client);
        }
    }

    /// Number of clients with a search in progress.
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }
}

pub struct Aggregator {
    counter: Arc<CountFetcher>,
    pacer: Arc<dyn Pacer>,
    delay: Duration,
    failure_policy: FailurePolicy,
}

impl Aggregator {
    pub fn new(counter: Arc<CountFetcher>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            counter,
            pacer,
            delay: DEFAULT_PAIR_DELAY,
            failure_policy: FailurePolicy::Continue,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn counter(&self) -> &Arc<CountFetcher> {
        &self.counter
    }

    /// Count every pair of `first × second`, in generation order.
    ///
    /// Returns the full ordered result list. With `FailurePolicy::Continue` a
    /// failing pair becomes a `PairOutcome::Failed` entry; with `Abort` the
    /// error is returned. Cancellation is honoured before each pair, during the
    /// inter-pair pause and while a request is in flight.
    pub async fn search<S: AsRef<str>>(
        &self,
        first: &[S],
        second: &[S],
        presenter: &dyn Presenter,
        token: &SearchToken,
    ) -> AppResult<Vec<PairOutcome>> {
        let pairs = generate_pairs(first, second);
        let total = pairs.len();
        info!(
            pairs = total,
            queries = %pairs.iter().map(|p| p.query()).collect::<Vec<_>>().join(", "),
            "Starting pair search"
        );
        presenter.on_pairs(&pairs);

        let mut results: Vec<PairOutcome> = Vec::with_capacity(total);
        for (i, pair) in pairs.iter().enumerate() {
            let cancelled = || AppError::Cancelled {
                completed: i,
                total,
            };
            if token.is_cancelled() {
                return Err(cancelled());
            }

            if i > 0 {
                tokio::select! {
                    _ = self.pacer.pause(self.delay) => {}
                    _ = token.cancelled() => return Err(cancelled()),
                }
            }

            let counted = tokio::select! {
                counted = self.counter.count(&pair.first, &pair.second) => counted,
                _ = token.cancelled() => return Err(cancelled()),
            };

            let outcome = match counted {
                Ok(count) => {
                    info!(pair = %pair, count, "Pair counted");
                    PairOutcome::Counted(CountResult::new(pair, count))
                }
                Err(e) => {
                    warn!(pair = %pair, error = %e, "Pair count failed");
                    if self.failure_policy == FailurePolicy::Abort {
                        return Err(AppError::Fetch(e));
                    }
                    PairOutcome::Failed(PairFailure::new(pair, &e))
                }
            };

            results.push(outcome);
            presenter.on_progress(&results);
        }

        info!(pairs = total, "Pair search complete");
        Ok(results)
    }
}
