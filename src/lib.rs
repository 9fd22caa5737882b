//! # Colmado Search Gateway
//!
//! Forwards product searches to a Meilisearch engine, trying the store's own
//! index first and falling back to a shared global catalog when the store has
//! nothing to offer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ HTTP server  │──▶│ validate   │──▶│ FallbackSearch │──▶│ SearchEngine │
//! │ (axum)       │   │            │   │ local → global │   │ (Meilisearch)│
//! └──────────────┘   └────────────┘   └────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export MEILISEARCH_HOST=http://localhost:7700
//! export MEILISEARCH_API_KEY=...
//! search-gateway serve
//! search-gateway search "arroz" --slug colmado_william
//! search-gateway health
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment / CLI configuration |
//! | [`models`] | Request, result and health types |
//! | [`engine`] | `SearchEngine` trait and Meilisearch client |
//! | [`fallback`] | Tenant-first search with global fallback |
//! | [`validate`] | Inbound request validation |
//! | [`server`] | HTTP API |
//! | [`logging`] | `tracing` subscriber setup |

pub mod config;
pub mod engine;
pub mod fallback;
pub mod logging;
pub mod models;
pub mod server;
pub mod validate;

/// Name reported in the banner and health responses.
pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
