// In-memory literature index for pipeline tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::eutils::{ESearchResponse, ESearchResult, FetchError, LiteratureIndex};

#[derive(Default)]
pub struct MockIndex {
    counts: HashMap<String, Result<u64, FetchError>>,
    abstracts: Option<Result<String, FetchError>>,
    ids: Vec<String>,
    pub esearch_calls: AtomicUsize,
    pub efetch_calls: AtomicUsize,
    pub terms: Mutex<Vec<String>>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, term: &str, count: u64) -> Self {
        self.counts.insert(term.to_string(), Ok(count));
        self
    }

    pub fn with_failure(mut self, term: &str, error: FetchError) -> Self {
        self.counts.insert(term.to_string(), Err(error));
        self
    }

    pub fn with_abstracts(mut self, ids: &[&str], text: &str) -> Self {
        self.ids = ids.iter().map(|s| s.to_string()).collect();
        self.abstracts = Some(Ok(text.to_string()));
        self
    }

    pub fn with_efetch_failure(mut self, ids: &[&str], error: FetchError) -> Self {
        self.ids = ids.iter().map(|s| s.to_string()).collect();
        self.abstracts = Some(Err(error));
        self
    }

    pub fn esearch_count(&self) -> usize {
        self.esearch_calls.load(Ordering::SeqCst)
    }

    pub fn efetch_count(&self) -> usize {
        self.efetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiteratureIndex for MockIndex {
    async fn esearch(&self, term: &str) -> Result<ESearchResponse, FetchError> {
        self.esearch_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut terms) = self.terms.lock() {
            terms.push(term.to_string());
        }

        let count = match self.counts.get(term) {
            Some(Ok(n)) => *n,
            Some(Err(e)) => return Err(e.clone()),
            None => self.ids.len() as u64,
        };

        Ok(ESearchResponse {
            esearchresult: ESearchResult {
                count: Some(count.to_string()),
                idlist: self.ids.clone(),
                webenv: Some("MCID_TEST".to_string()),
                querykey: Some("1".to_string()),
                error: None,
            },
        })
    }

    async fn efetch_abstracts(&self, _webenv: Option<&str>, ids: &[String]) -> Result<String, FetchError> {
        self.efetch_calls.fetch_add(1, Ordering::SeqCst);
        if ids.is_empty() {
            return Ok(String::new());
        }
        self.abstracts.clone().unwrap_or_else(|| Ok(String::new()))
    }
}
