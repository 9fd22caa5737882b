//! # Search Gateway CLI (`search-gateway`)
//!
//! ## Usage
//!
//! ```bash
//! search-gateway [OPTIONS] [COMMAND]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search-gateway serve` | Start the HTTP server (default) |
//! | `search-gateway search "<query>" --slug <tenant>` | Run one fallback search and print the result |
//! | `search-gateway health` | Probe the engine and print its status |
//!
//! Every option can also be set through its environment variable
//! (`PORT`, `MEILISEARCH_HOST`, `MEILISEARCH_API_KEY`, ...). See `--help`.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::sync::Arc;

use search_gateway::config::ConfigArgs;
use search_gateway::engine::{probe_health, MeilisearchClient};
use search_gateway::fallback::FallbackSearch;
use search_gateway::validate::validate_search_request;
use search_gateway::{logging, server};

/// Tenant-first product search gateway with global catalog fallback.
#[derive(Parser)]
#[command(name = "search-gateway", version, about)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve,

    /// Run a single search through the fallback logic and print the result.
    ///
    /// Uses the same validation rules as `POST /api/v1/search`.
    Search {
        /// The search query string.
        query: String,

        /// Tenant identifier (lowercase letters, digits, `_`, `-`).
        #[arg(long)]
        slug: String,

        /// Maximum number of hits (1-100).
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Number of hits to skip.
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// Probe the engine's health endpoint.
    Health,
}

/// Shape CLI arguments like a `POST /api/v1/search` body so both paths share
/// one validator.
fn search_body(query: &str, slug: &str, limit: Option<i64>, offset: Option<i64>) -> Value {
    json!({
        "query": query,
        "slug": slug,
        "limit": limit,
        "offset": offset,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.config.into_config()?;

    logging::init_logging(&cfg.log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting search gateway");
            server::run_server(&cfg).await?;
        }
        Commands::Search {
            query,
            slug,
            limit,
            offset,
        } => {
            let body = search_body(&query, &slug, limit, offset);
            let request = match validate_search_request(&body) {
                Ok(request) => request,
                Err(errors) => {
                    for e in &errors {
                        eprintln!("{}: {}", e.field, e.message);
                    }
                    bail!("invalid search request");
                }
            };

            let engine = MeilisearchClient::new(&cfg.engine)
                .context("failed to create Meilisearch client")?;
            let search = FallbackSearch::new(Arc::new(engine), &cfg.indexes);
            let result = search.resolve(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Health => {
            let engine = MeilisearchClient::new(&cfg.engine)
                .context("failed to create Meilisearch client")?;
            let status = probe_health(&engine).await;
            let healthy = status.is_healthy();
            let (_, body) = server::health_report(status);
            println!("{}", serde_json::to_string_pretty(&body)?);
            if !healthy {
                bail!("engine is unhealthy");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_search(args: &[&str]) -> Value {
        let mut argv = vec!["search-gateway", "search"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Search {
                query,
                slug,
                limit,
                offset,
            }) => search_body(&query, &slug, limit, offset),
            _ => panic!("expected the search subcommand"),
        }
    }

    #[test]
    fn test_negative_offset_reaches_validator() {
        let body = parse_search(&["arroz", "--slug", "colmado_william", "--offset", "-1"]);
        assert_eq!(body["offset"], -1);

        let errors = validate_search_request(&body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "offset");
        assert_eq!(
            errors[0].message,
            "offset must be an integer greater than or equal to 0"
        );
    }

    #[test]
    fn test_negative_limit_reaches_validator() {
        let body = parse_search(&["arroz", "--slug", "colmado_william", "--limit", "-5"]);
        let errors = validate_search_request(&body).unwrap_err();
        assert_eq!(errors[0].field, "limit");
    }

    #[test]
    fn test_omitted_paging_uses_defaults() {
        let body = parse_search(&["arroz", "--slug", "colmado_william"]);
        let request = validate_search_request(&body).unwrap();
        assert_eq!(request.limit, 20);
        assert_eq!(request.offset, 0);
    }
}
