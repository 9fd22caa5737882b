//! Core data models used throughout the gateway.
//!
//! These types are request-scoped: a [`SearchRequest`] is produced by
//! validation, flows through the fallback logic, and comes back out as a
//! [`SearchResult`]. Nothing here is persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// A validated search request. Only [`crate::validate`] builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub tenant_id: String,
    pub limit: u32,
    pub offset: u64,
}

/// Which index satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Local,
    Global,
}

/// Uniform result envelope returned for every successful search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub source: ResultSource,
    pub index_name: String,
    /// Engine records, passed through untouched.
    pub hits: Vec<Value>,
    pub total: u64,
    pub query: String,
    pub limit: u32,
    pub offset: u64,
    pub processing_time_ms: u64,
}

/// The engine's answer for a single index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineHits {
    pub hits: Vec<Value>,
    /// Engine-reported estimate when available, else the returned hit count.
    pub total: u64,
    pub processing_time_ms: u64,
}

impl EngineHits {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Outcome of the tenant-index step. The local step never fails: any engine
/// error is folded into [`LocalOutcome::NoLocalResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum LocalOutcome {
    Hit(SearchResult),
    NoLocalResult,
}

/// Status string reported by the engine's own health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineHealth {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Result of one health probe. Computed fresh on every call.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy(EngineHealth),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn state(&self) -> HealthState {
        match self {
            HealthStatus::Healthy(_) => HealthState::Healthy,
            HealthStatus::Unhealthy(_) => HealthState::Unhealthy,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy(_))
    }
}
