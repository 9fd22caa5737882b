//! Search engine client abstraction and the Meilisearch implementation.
//!
//! The gateway only needs two things from the engine: search one index by
//! name, and report health. [`SearchEngine`] captures exactly that, so the
//! fallback logic and the HTTP layer can run against [`MeilisearchClient`] in
//! production and an in-memory fake in tests.
//!
//! # Wire format
//!
//! | Operation | Request | Fields read |
//! |-----------|---------|-------------|
//! | search | `POST {host}/indexes/{index}/search` with `{q, limit, offset}` | `hits`, `estimatedTotalHits`, `processingTimeMs` |
//! | health | `GET {host}/health` | `status` |
//!
//! Every request carries `Authorization: Bearer {api_key}` and is bounded by
//! the configured timeout. There are no retries.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::{EngineHealth, EngineHits, HealthStatus};

/// Errors produced while talking to the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No credential configured. Fatal at startup.
    #[error("MEILISEARCH_API_KEY is not set; the engine client cannot be created")]
    MissingApiKey,

    /// The configured host is not a usable http(s) base URL.
    #[error("invalid engine host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    /// The call did not complete within the configured timeout.
    #[error("engine request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("engine transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("engine returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The engine answered 2xx with a body we could not interpret.
    #[error("invalid engine response: {0}")]
    Decode(String),
}

/// Operations the gateway needs from a full-text search engine.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Search `index` for `query`, returning at most `limit` hits starting at
    /// `offset`.
    async fn search(
        &self,
        index: &str,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<EngineHits, EngineError>;

    /// Ask the engine for its own health status.
    async fn health(&self) -> Result<EngineHealth, EngineError>;
}

/// Probe the engine and fold the outcome into a [`HealthStatus`].
pub async fn probe_health(engine: &dyn SearchEngine) -> HealthStatus {
    match engine.health().await {
        Ok(health) => {
            tracing::debug!(status = %health.status, "engine health probe succeeded");
            HealthStatus::Healthy(health)
        }
        Err(e) => {
            tracing::error!(error = %e, "engine health probe failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// Long-lived Meilisearch client. Create one at startup and share it.
pub struct MeilisearchClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for MeilisearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeilisearchClient")
            .field("base", &self.base.as_str())
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl MeilisearchClient {
    /// Build the client from configuration.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MissingApiKey`] if no key (or a blank key) is configured.
    /// - [`EngineError::InvalidHost`] if the host is not an absolute http(s) URL.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(EngineError::MissingApiKey)?
            .to_string();

        let base = parse_base_url(&config.host)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(EngineError::Transport)?;

        Ok(Self {
            http,
            base,
            api_key,
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidHost {
                host: self.base.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_reqwest(&self, err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_decode() {
            EngineError::Decode(err.to_string())
        } else {
            EngineError::Transport(err)
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, EngineError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        response.json::<Value>().await.map_err(|e| self.map_reqwest(e))
    }
}

#[async_trait]
impl SearchEngine for MeilisearchClient {
    async fn search(
        &self,
        index: &str,
        query: &str,
        limit: u32,
        offset: u64,
    ) -> Result<EngineHits, EngineError> {
        let url = self.endpoint(&["indexes", index, "search"])?;
        let body = json!({
            "q": query,
            "limit": limit,
            "offset": offset,
        });

        let json = self.send(self.http.post(url).json(&body)).await?;
        parse_search_response(json)
    }

    async fn health(&self) -> Result<EngineHealth, EngineError> {
        let url = self.endpoint(&["health"])?;
        let json = self.send(self.http.get(url)).await?;
        serde_json::from_value(json).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

fn parse_base_url(host: &str) -> Result<Url, EngineError> {
    let invalid = |reason: String| EngineError::InvalidHost {
        host: host.to_string(),
        reason,
    };

    let url = Url::parse(host.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    Ok(url)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResponse {
    hits: Vec<Value>,
    estimated_total_hits: Option<u64>,
    #[serde(default)]
    processing_time_ms: u64,
}

/// Interpret a Meilisearch search response body.
///
/// `total` prefers the engine's `estimatedTotalHits` and only falls back to
/// the number of returned hits when the engine omits it.
fn parse_search_response(json: Value) -> Result<EngineHits, EngineError> {
    let raw: RawSearchResponse =
        serde_json::from_value(json).map_err(|e| EngineError::Decode(e.to_string()))?;

    let total = raw
        .estimated_total_hits
        .unwrap_or(raw.hits.len() as u64);

    Ok(EngineHits {
        hits: raw.hits,
        total,
        processing_time_ms: raw.processing_time_ms,
    })
}

#[derive(Deserialize)]
struct RawApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> EngineError {
    match serde_json::from_str::<RawApiError>(body) {
        Ok(raw) => EngineError::Api {
            status: status.as_u16(),
            code: raw.code,
            message: raw.message,
        },
        Err(_) => EngineError::Api {
            status: status.as_u16(),
            code: None,
            message: if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            },
        },
    }
}
