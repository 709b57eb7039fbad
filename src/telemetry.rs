//! Diagnostics for the runtime itself.
//!
//! Configuration and connectivity decisions are reported through `tracing`
//! on stderr, separate from the component log lines on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::EcosystemConfig;

/// Map an ecosystem log level name onto a tracing filter directive
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.trim().to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Filter directive for the configured `log_level`
pub fn tracing_directive(config: &EcosystemConfig) -> &'static str {
    filter_directive(&config.log_level)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured `log_level` picks the filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(
    config: &EcosystemConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_directive(config)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
