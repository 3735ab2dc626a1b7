//! Telemetry initialisation for the `fieldseal` binary.
//!
//! Structured JSON logs only, written to stderr so that stdout carries nothing
//! but transformed data.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, envelope text, or key material** in any log field.
//!   Only counts, lengths, line numbers and error codes.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
