//! Process configuration.
//!
//! Values are read once at startup from environment variables (or the
//! matching command-line flags) via [`ConfigArgs`], then validated into a
//! nested [`Config`] that the rest of the crate consumes.

use anyhow::{bail, Result};
use clap::Args;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub indexes: IndexConfig,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `production` hides internal error text from 500 responses.
    pub environment: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

#[derive(Clone)]
pub struct EngineConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: default_engine_host(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub global_index: String,
    pub local_prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            global_index: default_global_index(),
            local_prefix: default_local_prefix(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_environment() -> String {
    "production".to_string()
}
fn default_engine_host() -> String {
    "http://localhost:7700".to_string()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_global_index() -> String {
    "colmado_inventory".to_string()
}
fn default_local_prefix() -> String {
    "productos_colmado_".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            indexes: IndexConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// Raw configuration as read from the environment or the command line.
#[derive(Clone, Args)]
pub struct ConfigArgs {
    /// Interface to bind the HTTP server to.
    #[arg(long, env = "HOST", default_value_t = default_host())]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = default_port())]
    pub port: u16,

    /// Base URL of the Meilisearch engine.
    #[arg(long, env = "MEILISEARCH_HOST", default_value_t = default_engine_host())]
    pub meilisearch_host: String,

    /// API key sent to Meilisearch. Required to serve.
    #[arg(long, env = "MEILISEARCH_API_KEY", hide_env_values = true)]
    pub meilisearch_api_key: Option<String>,

    /// Shared catalog index consulted when the tenant index has no match.
    #[arg(long, env = "GLOBAL_INDEX", default_value_t = default_global_index())]
    pub global_index: String,

    /// Prefix prepended to the tenant id to form the tenant index name.
    #[arg(long, env = "LOCAL_INDEX_PREFIX", default_value_t = default_local_prefix())]
    pub local_index_prefix: String,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "LOG_LEVEL", default_value_t = default_log_level())]
    pub log_level: String,

    /// Timeout for each call to the engine, in milliseconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = default_timeout_ms())]
    pub request_timeout: u64,

    /// Deployment environment. Anything other than `production` exposes
    /// internal error messages in 500 responses.
    #[arg(long, env = "APP_ENV", default_value_t = default_environment())]
    pub app_env: String,
}

impl ConfigArgs {
    /// Validate the raw values and build a [`Config`].
    ///
    /// The API key is not checked here; the engine client refuses to start
    /// without one, which lets `--help`-style commands work without it.
    pub fn into_config(self) -> Result<Config> {
        let config = Config {
            server: ServerConfig {
                host: self.host,
                port: self.port,
                environment: self.app_env,
            },
            engine: EngineConfig {
                host: self.meilisearch_host,
                api_key: self.meilisearch_api_key,
                timeout_ms: self.request_timeout,
            },
            indexes: IndexConfig {
                global_index: self.global_index,
                local_prefix: self.local_index_prefix,
            },
            log_level: self.log_level,
        };
        validate_config(&config)?;
        Ok(config)
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.engine.timeout_ms == 0 {
        bail!("REQUEST_TIMEOUT must be > 0");
    }

    if config.indexes.global_index.trim().is_empty() {
        bail!("GLOBAL_INDEX must not be empty");
    }

    let host = config.engine.host.trim();
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        bail!(
            "MEILISEARCH_HOST must be an http(s) URL, got '{}'",
            config.engine.host
        );
    }

    if config.server.host.trim().is_empty() {
        bail!("HOST must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["search-gateway"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv)?.config.into_config()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.indexes.global_index, "colmado_inventory");
        assert_eq!(config.indexes.local_prefix, "productos_colmado_");
        assert_eq!(config.engine.timeout(), Duration::from_millis(5000));
        assert_eq!(config.log_level, "info");
        assert!(config.server.is_production());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            engine: EngineConfig {
                api_key: Some("super-secret-master-key".to_string()),
                ..EngineConfig::default()
            },
            ..Config::default()
        };

        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-master-key"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("http://localhost:7700"));

        let printed = format!("{:?}", EngineConfig::default());
        assert!(printed.contains("api_key: None"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--meilisearch-host",
            "https://search.example.com",
            "--meilisearch-api-key",
            "secret",
            "--global-index",
            "catalogo",
            "--request-timeout",
            "250",
            "--app-env",
            "development",
        ])
        .unwrap();

        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.engine.host, "https://search.example.com");
        assert_eq!(config.engine.api_key.as_deref(), Some("secret"));
        assert_eq!(config.indexes.global_index, "catalogo");
        assert_eq!(config.engine.timeout_ms, 250);
        assert!(!config.server.is_production());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = parse(&["--request-timeout", "0"]).unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT"));
    }

    #[test]
    fn test_rejects_non_http_host() {
        let err = parse(&["--meilisearch-host", "localhost:7700"]).unwrap_err();
        assert!(err.to_string().contains("MEILISEARCH_HOST"));
    }

    #[test]
    fn test_rejects_blank_global_index() {
        let err = parse(&["--global-index", "  "]).unwrap_err();
        assert!(err.to_string().contains("GLOBAL_INDEX"));
    }
}
