//! Cache-first retrying fetcher.
//!
//! Every remote read goes through [`Fetcher::fetch`]: a key already present
//! in the [`CacheStore`] is served without touching the network; otherwise
//! the request waits for a [`ThrottlingQueue`] permit, is issued, checked for
//! the provider's in-band error marker and persisted. Failed attempts are
//! retried per [`RetryConfig`]; nothing is written unless an attempt succeeds.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheStore};
use crate::domain::ResourceKey;
use crate::endpoint::{FetchJob, Provider, RemoteRequest};
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::throttling::ThrottlingQueue;

/// In-band failure marker of the fundamentals API (sent with status 200).
pub const ERROR_MARKER: &str = "Error Message";

pub const DEFAULT_FUNDAMENTALS_BASE_URL: &str = "https://financialmodelingprep.com/api";
pub const DEFAULT_FX_BASE_URL: &str = "https://api.exchangerate.host";

const REDACTED: &str = "***";

/// Remote endpoints, credentials and retry policy of a [`Fetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    pub fundamentals_base_url: String,
    pub fx_base_url: String,
    pub api_key: Option<String>,
    pub fx_access_key: Option<String>,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            fundamentals_base_url: String::from(DEFAULT_FUNDAMENTALS_BASE_URL),
            fx_base_url: String::from(DEFAULT_FX_BASE_URL),
            api_key: None,
            fx_access_key: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

/// Where a returned blob came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    Cache,
    Network,
}

/// Bytes stored under `key`, cached or freshly fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub key: ResourceKey,
    pub body: Vec<u8>,
    pub source: FetchSource,
}

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the cache; no request was issued.
    Cached(Vec<u8>),
    /// Fetched, validated and persisted.
    Fetched(Vec<u8>),
    /// Transport failure, non-2xx status or cache write failure.
    TransientFailure(String),
    /// The upstream answered but the payload is an error or unusable.
    SemanticFailure(String),
}

/// Fatal fetch errors. Retryable conditions never surface here directly.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API key configured; '{key}' must be fetched from the {provider} provider")]
    MissingApiKey { key: ResourceKey, provider: Provider },

    #[error(
        "couldn't download '{endpoint}' into '{key}' after {attempts} attempts: {last_failure}"
    )]
    Exhausted {
        key: ResourceKey,
        endpoint: String,
        attempts: u32,
        last_failure: String,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FetchError {
    pub fn key(&self) -> Option<&ResourceKey> {
        match self {
            Self::MissingApiKey { key, .. } | Self::Exhausted { key, .. } => Some(key),
            Self::Cache(CacheError::NotFound { key }) | Self::Cache(CacheError::Io { key, .. }) => {
                Some(key)
            }
        }
    }
}

/// Cache-first, rate-limited, retrying fetcher.
pub struct Fetcher {
    http_client: Arc<dyn HttpClient>,
    cache: CacheStore,
    throttling: ThrottlingQueue,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        cache: CacheStore,
        throttling: ThrottlingQueue,
        config: FetcherConfig,
    ) -> Self {
        Self {
            http_client,
            cache,
            throttling,
            config,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the cached or freshly fetched bytes for `job`.
    pub async fn fetch(&self, job: &FetchJob) -> Result<Fetched, FetchError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(job).await? {
                FetchOutcome::Cached(body) => {
                    return Ok(Fetched {
                        key: job.key.clone(),
                        body,
                        source: FetchSource::Cache,
                    });
                }
                FetchOutcome::Fetched(body) => {
                    return Ok(Fetched {
                        key: job.key.clone(),
                        body,
                        source: FetchSource::Network,
                    });
                }
                FetchOutcome::TransientFailure(reason) | FetchOutcome::SemanticFailure(reason) => {
                    warn!(
                        key = %job.key,
                        endpoint = %job.request.path,
                        attempt,
                        max_attempts,
                        "fetch attempt failed: {reason}"
                    );
                    last_failure = reason;
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry.delay_after_attempt(attempt)).await;
            }
        }

        Err(FetchError::Exhausted {
            key: job.key.clone(),
            endpoint: job.request.path.clone(),
            attempts: max_attempts,
            last_failure,
        })
    }

    /// One attempt. `Err` is reserved for conditions retrying cannot fix.
    pub async fn attempt(&self, job: &FetchJob) -> Result<FetchOutcome, FetchError> {
        if self.cache.exists(&job.key) {
            debug!(key = %job.key, "cache hit");
            return Ok(FetchOutcome::Cached(self.cache.read(&job.key)?));
        }

        let url = self.url_for(&job.key, &job.request, false)?;
        let redacted = self.url_for(&job.key, &job.request, true)?;

        self.throttling.acquire().await;
        info!(key = %job.key, url = %redacted, "fetching");

        let request = HttpRequest::get(url).with_timeout(self.config.request_timeout);
        let response = match self.http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => return Ok(FetchOutcome::TransientFailure(error.message().to_owned())),
        };

        if !response.is_success() {
            return Ok(FetchOutcome::TransientFailure(format!(
                "upstream returned status {}",
                response.status
            )));
        }

        if response.body.contains(ERROR_MARKER) {
            return Ok(FetchOutcome::SemanticFailure(format!(
                "upstream reported an error: {}",
                truncate(&response.body, 200)
            )));
        }

        if let Err(error) = serde_json::from_str::<serde::de::IgnoredAny>(&response.body) {
            return Ok(FetchOutcome::SemanticFailure(format!(
                "payload is not valid JSON: {error}"
            )));
        }

        let body = response.body.into_bytes();
        if let Err(error) = self.cache.write(&job.key, &body) {
            return Ok(FetchOutcome::TransientFailure(error.to_string()));
        }

        Ok(FetchOutcome::Fetched(body))
    }

    fn url_for(
        &self,
        key: &ResourceKey,
        request: &RemoteRequest,
        redact: bool,
    ) -> Result<String, FetchError> {
        let mut params: Vec<String> = Vec::new();

        let base = match request.provider {
            Provider::Fundamentals => {
                let api_key = self
                    .config
                    .api_key
                    .as_deref()
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| FetchError::MissingApiKey {
                        key: key.clone(),
                        provider: request.provider,
                    })?;
                params.push(format!("apikey={}", if redact { REDACTED } else { api_key }));
                &self.config.fundamentals_base_url
            }
            Provider::Fx => {
                if let Some(access_key) = self.config.fx_access_key.as_deref() {
                    params.push(format!(
                        "access_key={}",
                        if redact { REDACTED } else { access_key }
                    ));
                }
                &self.config.fx_base_url
            }
        };

        if !request.query.is_empty() {
            params.push(request.query.to_query_string());
        }

        let mut url = format!("{}{}", base.trim_end_matches('/'), request.path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        Ok(url)
    }
}

fn truncate(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
