//! Tenant-first search with global catalog fallback.
//!
//! The tenant index is authoritative when it has something to say: its
//! products carry the store's own prices. When it is empty, missing, or
//! unreachable, the shared global catalog answers instead.
//!
//! ```text
//!   SearchRequest
//!        │
//!        ▼
//!  search_local(prefix + tenant) ──── Hit ────────────▶ SearchResult{source: local}
//!        │
//!   NoLocalResult (0 hits or any error)
//!        │
//!        ▼
//!  engine.search(global) ─────── Ok ──────────────────▶ SearchResult{source: global}
//!        │
//!       Err ─────────────────────────────────────────▶ EngineError (propagated)
//! ```
//!
//! The two engine calls are strictly sequential; the second is issued only
//! after the first has been observed.

use std::sync::Arc;

use crate::config::IndexConfig;
use crate::engine::{EngineError, SearchEngine};
use crate::models::{EngineHits, LocalOutcome, ResultSource, SearchRequest, SearchResult};

/// Fallback search over an injected engine handle.
#[derive(Clone)]
pub struct FallbackSearch {
    engine: Arc<dyn SearchEngine>,
    local_prefix: String,
    global_index: String,
}

impl FallbackSearch {
    pub fn new(engine: Arc<dyn SearchEngine>, indexes: &IndexConfig) -> Self {
        Self {
            engine,
            local_prefix: indexes.local_prefix.clone(),
            global_index: indexes.global_index.clone(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }

    pub fn global_index(&self) -> &str {
        &self.global_index
    }

    /// Name of the tenant's own index.
    pub fn local_index_name(&self, tenant_id: &str) -> String {
        format!("{}{}", self.local_prefix, tenant_id)
    }

    /// Search the tenant index. Never fails.
    ///
    /// Any engine error, including "index not found" for tenants that have
    /// not been provisioned yet, is logged and reported as
    /// [`LocalOutcome::NoLocalResult`].
    pub async fn search_local(&self, request: &SearchRequest) -> LocalOutcome {
        let index = self.local_index_name(&request.tenant_id);

        match self
            .engine
            .search(&index, &request.query, request.limit, request.offset)
            .await
        {
            Ok(found) if !found.is_empty() => {
                tracing::info!(
                    index = %index,
                    hits = found.hits.len(),
                    total = found.total,
                    "tenant index answered"
                );
                LocalOutcome::Hit(build_result(ResultSource::Local, index, request, found))
            }
            Ok(_) => {
                tracing::info!(index = %index, query = %request.query, "no hits in tenant index");
                LocalOutcome::NoLocalResult
            }
            Err(e) => {
                tracing::warn!(index = %index, error = %e, "tenant index search failed, falling back");
                LocalOutcome::NoLocalResult
            }
        }
    }

    /// Resolve a request against the tenant index, then the global index.
    ///
    /// # Errors
    ///
    /// Only a failure of the global-index call is returned; tenant-index
    /// failures are absorbed by [`search_local`](Self::search_local).
    pub async fn resolve(&self, request: &SearchRequest) -> Result<SearchResult, EngineError> {
        if let LocalOutcome::Hit(result) = self.search_local(request).await {
            return Ok(result);
        }

        let found = self
            .engine
            .search(
                &self.global_index,
                &request.query,
                request.limit,
                request.offset,
            )
            .await?;

        tracing::info!(
            index = %self.global_index,
            hits = found.hits.len(),
            total = found.total,
            "global index answered"
        );

        Ok(build_result(
            ResultSource::Global,
            self.global_index.clone(),
            request,
            found,
        ))
    }
}

fn build_result(
    source: ResultSource,
    index_name: String,
    request: &SearchRequest,
    found: EngineHits,
) -> SearchResult {
    SearchResult {
        source,
        index_name,
        hits: found.hits,
        total: found.total,
        query: request.query.clone(),
        limit: request.limit,
        offset: request.offset,
        processing_time_ms: found.processing_time_ms,
    }
}
