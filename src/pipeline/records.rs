//! Record Fetcher: full paper records for one pair.
//!
//! Two sequential calls, never cached: a history-enabled esearch for the
//! identifier list and `WebEnv`, then one efetch for all identifiers as
//! abstract-formatted text, which is parsed block by block.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::presenter::Presenter;
use crate::models::{Pair, PaperSet, RejectedBlock};
use crate::search::{parse_abstracts, FetchError, LiteratureIndex};
use crate::types::AppResult;
use crate::utils::{with_retry, RetryPolicy};

pub struct RecordFetcher {
    index: Arc<dyn LiteratureIndex>,
    retry: RetryPolicy,
}

impl RecordFetcher {
    pub fn new(index: Arc<dyn LiteratureIndex>, retry: RetryPolicy) -> Self {
        Self { index, retry }
    }

    #[instrument(skip(self))]
    pub async fn papers(&self, first: &str, second: &str) -> Result<PaperSet, FetchError> {
        let label = Pair::new(first, second).query();

        let search = with_retry(&self.retry, FetchError::is_transient, || self.index.esearch(&label)).await?;
        let ids = &search.esearchresult.idlist;
        if ids.is_empty() {
            info!(pair = %label, "No papers to fetch");
            return Ok(PaperSet::empty(label));
        }

        let webenv = search.esearchresult.webenv.as_deref();
        let text = with_retry(&self.retry, FetchError::is_transient, || {
            self.index.efetch_abstracts(webenv, ids)
        })
        .await?;

        let mut set = PaperSet::empty(label);
        for parsed in parse_abstracts(&text) {
            match parsed {
                Ok(record) => set.records.push(record),
                Err(e) => {
                    warn!(pair = %set.label, error = %e, "Skipping unparseable record block");
                    set.rejected.push(RejectedBlock {
                        index: e.block_index(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            pair = %set.label,
            records = set.records.len(),
            rejected = set.rejected.len(),
            "Fetched papers"
        );
        Ok(set)
    }

    /// Fetch and hand the records to the presenter. On failure the presenter is
    /// not called, so whatever it rendered before stays in place.
    pub async fn drill_down(&self, first: &str, second: &str, presenter: &dyn Presenter) -> AppResult<PaperSet> {
        let set = self.papers(first, second).await?;
        presenter.on_papers(&set.records, &set.label);
        Ok(set)
    }
}
