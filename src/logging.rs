//! Logging setup.
//!
//! `RUST_LOG` wins when it is set; otherwise the configured `LOG_LEVEL` is
//! used as the filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(log_level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), log_level);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init();
}

fn build_filter(rust_log: Option<&str>, log_level: &str) -> EnvFilter {
    let directives = match rust_log {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => log_level.to_string(),
    };

    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!(
            "Warning: invalid log filter '{}' ({}), using 'info'",
            directives, e
        );
        EnvFilter::new("info")
    })
}
