use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pipeline::{Aggregator, CountFetcher, RecordFetcher, SearchSupervisor, TokioPacer};
use crate::search::{EutilsClient, FetchError, LiteratureIndex, QueryCache};
use crate::utils::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub aggregator: Arc<Aggregator>,
    pub records: Arc<RecordFetcher>,
    pub supervisor: SearchSupervisor,
}

impl AppState {
    /// Wire the pipeline against the live E-utilities endpoint.
    pub fn from_config(config: Config) -> Result<Self, FetchError> {
        let index: Arc<dyn LiteratureIndex> = Arc::new(EutilsClient::new(config.eutils.clone())?);
        Ok(Self::with_index(config, index))
    }

    pub fn with_index(config: Config, index: Arc<dyn LiteratureIndex>) -> Self {
        let retry = RetryPolicy::from_config(&config.pipeline);
        let cache = Arc::new(QueryCache::new());
        let counter = Arc::new(CountFetcher::new(index.clone(), cache, retry.clone()));
        let aggregator = Aggregator::new(counter, Arc::new(TokioPacer))
            .with_delay(config.pipeline.pair_delay())
            .with_failure_policy(config.pipeline.failure_policy);

        Self {
            aggregator: Arc::new(aggregator),
            records: Arc::new(RecordFetcher::new(index, retry)),
            supervisor: SearchSupervisor::new(),
            config,
        }
    }
}

/// One (first, second) term combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub first: String,
    pub second: String,
}

impl Pair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Compound query sent upstream; also the cache key.
    pub fn query(&self) -> String {
        format!("{} {}", self.first, self.second)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    pub pair: String,
    pub first: String,
    pub second: String,
    pub count: u64,
}

impl CountResult {
    pub fn new(pair: &Pair, count: u64) -> Self {
        Self {
            pair: pair.query(),
            first: pair.first.clone(),
            second: pair.second.clone(),
            count,
        }
    }
}

/// A pair whose count lookup failed; kept in the result list as an explicit marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFailure {
    pub pair: String,
    pub first: String,
    pub second: String,
    pub error: String,
}

impl PairFailure {
    pub fn new(pair: &Pair, error: impl fmt::Display) -> Self {
        Self {
            pair: pair.query(),
            first: pair.first.clone(),
            second: pair.second.clone(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PairOutcome {
    Counted(CountResult),
    Failed(PairFailure),
}

impl PairOutcome {
    pub fn pair(&self) -> &str {
        match self {
            PairOutcome::Counted(r) => &r.pair,
            PairOutcome::Failed(f) => &f.pair,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            PairOutcome::Counted(r) => Some(r.count),
            PairOutcome::Failed(_) => None,
        }
    }
}

/// One citation parsed out of an efetch abstract dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Publication year, stored as January 1st of that year
    pub year: NaiveDate,
    /// Raw citation segment, including the leading ordinal
    pub journal: String,
    pub title: String,
    pub authors: String,
    pub institutions: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pmid: String,
}

impl PaperRecord {
    /// Citation line without the `"1. "` ordinal efetch prefixes to every record.
    pub fn citation(&self) -> &str {
        strip_ordinal(&self.journal)
    }

    pub fn pubmed_url(&self) -> String {
        format!("https://pubmed.ncbi.nlm.nih.gov/{}", self.pmid)
    }

    /// Split the abstract after `chars` characters: a teaser and the remainder.
    pub fn abstract_preview(&self, chars: usize) -> (&str, &str) {
        match self.abstract_text.char_indices().nth(chars) {
            Some((idx, _)) => self.abstract_text.split_at(idx),
            None => (self.abstract_text.as_str(), ""),
        }
    }
}

/// Drop the leading `"N. "` record ordinal from an efetch citation line.
pub fn strip_ordinal(citation: &str) -> &str {
    let trimmed = citation.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix('.') {
            return rest.trim_start();
        }
    }
    trimmed
}

/// A block of the efetch dump that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedBlock {
    pub index: usize,
    pub reason: String,
}

/// Result of one drill-down: the records for a pair plus the blocks that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSet {
    pub label: String,
    pub records: Vec<PaperRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedBlock>,
}

impl PaperSet {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

// API Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Delimiter-separated first-group terms
    pub first: String,
    /// Delimiter-separated second-group terms
    pub second: String,
    /// Identifies the caller; a new search from the same client cancels its previous one
    #[serde(default)]
    pub client_id: Option<String>,
    /// Fetch the first pair's papers once the counts are in
    #[serde(default)]
    pub papers_for_first: bool,
}

#[derive(Debug, Deserialize)]
pub struct PapersQuery {
    pub first: String,
    pub second: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
