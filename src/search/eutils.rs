//! NCBI E-utilities Client
//!
//! Two endpoints are used:
//! - `esearch.fcgi`: result count, identifier list and history session (`WebEnv`)
//! - `efetch.fcgi`: plain-text abstracts for a batch of identifiers
//!
//! Every request goes through a client-side rate limiter so the upstream
//! per-second quota is never exceeded, whatever the caller's pacing.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::EutilsConfig;

/// Errors talking to the literature index
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),
}

impl FetchError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout => true,
            FetchError::Status { status } => *status == 429 || *status >= 500,
            FetchError::MalformedResponse(_) | FetchError::MissingField(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status { status: status.as_u16() }
        } else if e.is_decode() {
            FetchError::MalformedResponse(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Raw esearch JSON envelope. Cached verbatim by the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ESearchResponse {
    pub esearchresult: ESearchResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ESearchResult {
    /// Decimal string, as the API sends it
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
    #[serde(default)]
    pub webenv: Option<String>,
    #[serde(default)]
    pub querykey: Option<String>,
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
}

impl ESearchResponse {
    /// Total number of records matching the query.
    pub fn count(&self) -> Result<u64, FetchError> {
        let raw = self
            .esearchresult
            .count
            .as_deref()
            .ok_or(FetchError::MissingField("esearchresult.count"))?;
        raw.trim().parse::<u64>().map_err(|_| {
            FetchError::MalformedResponse(format!("count '{}' is not a non-negative integer", raw))
        })
    }
}

/// The remote literature index, as seen by the pipeline.
#[async_trait]
pub trait LiteratureIndex: Send + Sync {
    /// History-enabled search for `term`.
    async fn esearch(&self, term: &str) -> Result<ESearchResponse, FetchError>;

    /// Abstract-formatted plain text for `ids`, optionally scoped to a history session.
    async fn efetch_abstracts(&self, webenv: Option<&str>, ids: &[String]) -> Result<String, FetchError>;
}

pub struct EutilsClient {
    client: Client,
    config: EutilsConfig,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl EutilsClient {
    pub fn new(config: EutilsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("{}/{}", config.tool, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("email", self.config.email.clone()),
            ("tool", self.config.tool.clone()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    async fn get(&self, name: &str, params: &[(&'static str, String)]) -> Result<reqwest::Response, FetchError> {
        self.limiter.until_ready().await;

        let response = self.client.get(self.endpoint(name)).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }
        Ok(response)
    }
}

#[async_trait]
impl LiteratureIndex for EutilsClient {
    #[instrument(skip(self))]
    async fn esearch(&self, term: &str) -> Result<ESearchResponse, FetchError> {
        let mut params = self.identity_params();
        params.push(("usehistory", "y".to_string()));
        params.push(("db", self.config.db.clone()));
        params.push(("term", term.to_string()));
        params.push(("retmode", "json".to_string()));

        let body = self.get("esearch.fcgi", &params).await?.text().await?;
        let parsed: ESearchResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        if let Some(error) = &parsed.esearchresult.error {
            return Err(FetchError::MalformedResponse(format!("esearch error: {}", error)));
        }

        debug!(
            count = ?parsed.esearchresult.count,
            ids = parsed.esearchresult.idlist.len(),
            "esearch completed"
        );
        Ok(parsed)
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn efetch_abstracts(&self, webenv: Option<&str>, ids: &[String]) -> Result<String, FetchError> {
        if ids.is_empty() {
            return Ok(String::new());
        }

        let mut params = self.identity_params();
        if let Some(webenv) = webenv {
            params.push(("WebEnv", webenv.to_string()));
        }
        params.push(("db", self.config.db.clone()));
        params.push(("rettype", "abstract".to_string()));
        params.push(("retmode", "text".to_string()));
        params.push(("id", ids.join(",")));

        let text = self.get("efetch.fcgi", &params).await?.text().await?;
        debug!(bytes = text.len(), "efetch completed");
        Ok(text)
    }
}
