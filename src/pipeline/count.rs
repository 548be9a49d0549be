//! Count Fetcher: number of records upstream reports for `"{first} {second}"`.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::models::Pair;
use crate::search::{FetchError, LiteratureIndex, QueryCache};
use crate::utils::{with_retry, RetryPolicy};

pub struct CountFetcher {
    index: Arc<dyn LiteratureIndex>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
}

impl CountFetcher {
    pub fn new(index: Arc<dyn LiteratureIndex>, cache: Arc<QueryCache>, retry: RetryPolicy) -> Self {
        Self { index, cache, retry }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Repeated pairs within the cache's lifetime cost no network round trip.
    #[instrument(skip(self))]
    pub async fn count(&self, first: &str, second: &str) -> Result<u64, FetchError> {
        let term = Pair::new(first, second).query();

        let response = self
            .cache
            .lookup_or_fetch(&term, || async {
                with_retry(&self.retry, FetchError::is_transient, || self.index.esearch(&term)).await
            })
            .await?;

        let count = response.count()?;
        debug!(term = %term, count, "Counted papers");
        Ok(count)
    }
}
