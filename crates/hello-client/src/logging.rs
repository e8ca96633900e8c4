//! Log output for the standalone poller.
//!
//! JSON lines on stderr. The poller produces no spans or metrics, so stdout
//! is left untouched.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set and parseable; otherwise `log_level` is used.
fn filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(log_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter(log_level))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise hello-client log subscriber")
}
