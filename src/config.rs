use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::search::pairs::DelimiterPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub eutils: EutilsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EutilsConfig {
    pub base_url: String,
    pub db: String,
    pub email: String,
    pub tool: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub pair_delay_ms: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub failure_policy: FailurePolicy,
    pub delimiter: DelimiterPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<String>,
}

/// What the aggregation loop does when one pair's count lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record a failed outcome for the pair and move on.
    Continue,
    /// Stop the whole search at the first failing pair.
    Abort,
}

impl FailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "continue" => Some(FailurePolicy::Continue),
            "abort" => Some(FailurePolicy::Abort),
            _ => None,
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Continue
    }
}

pub const DEFAULT_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EUTILS_BASE.to_string(),
            db: "pubmed".to_string(),
            email: "kslowikowski@gmail.com".to_string(),
            tool: "pubmed-pairs".to_string(),
            api_key: None,
            timeout_secs: 30,
            requests_per_second: 3,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pair_delay_ms: 1000,
            max_retries: 0,
            retry_base_ms: 500,
            failure_policy: FailurePolicy::Continue,
            delimiter: DelimiterPolicy::Comma,
        }
    }
}

impl EutilsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    pub fn pair_delay(&self) -> Duration {
        Duration::from_millis(self.pair_delay_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("NCBI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        // NCBI allows 10 req/s with a key, 3 without.
        let default_rps = if api_key.is_some() { "10" } else { "3" };

        let failure_policy_raw =
            env::var("PAIR_FAILURE_POLICY").unwrap_or_else(|_| "continue".to_string());
        let Some(failure_policy) = FailurePolicy::parse(&failure_policy_raw) else {
            bail!("PAIR_FAILURE_POLICY must be 'continue' or 'abort', got '{}'", failure_policy_raw);
        };

        let delimiter_raw = env::var("TERM_DELIMITER").unwrap_or_else(|_| "comma".to_string());
        let Some(delimiter) = DelimiterPolicy::parse(&delimiter_raw) else {
            bail!("TERM_DELIMITER must be 'comma' or 'mixed', got '{}'", delimiter_raw);
        };

        let requests_per_second: u32 = env::var("EUTILS_REQUESTS_PER_SECOND")
            .unwrap_or_else(|_| default_rps.to_string())
            .parse()?;
        if requests_per_second == 0 {
            bail!("EUTILS_REQUESTS_PER_SECOND must be at least 1");
        }

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            eutils: EutilsConfig {
                base_url: env::var("EUTILS_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_EUTILS_BASE.to_string()),
                db: env::var("EUTILS_DB").unwrap_or_else(|_| "pubmed".to_string()),
                email: env::var("EUTILS_EMAIL")
                    .unwrap_or_else(|_| "kslowikowski@gmail.com".to_string()),
                tool: env::var("EUTILS_TOOL").unwrap_or_else(|_| "pubmed-pairs".to_string()),
                api_key,
                timeout_secs: env::var("EUTILS_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                requests_per_second,
            },
            pipeline: PipelineConfig {
                pair_delay_ms: env::var("PAIR_DELAY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                max_retries: env::var("FETCH_MAX_RETRIES")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
                retry_base_ms: env::var("FETCH_RETRY_BASE_MS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()?,
                failure_policy,
                delimiter,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            },
        })
    }
}
