//! Log subscriber initialisation.

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// Configures a JSON-formatted [`tracing_subscriber`] layer for structured
/// log output, filtered by `RUST_LOG` when set and by `log_level` otherwise.
/// Errors the OpenTelemetry SDK reports out of band (failed exports, late
/// shutdown problems) are logged through the same subscriber.
///
/// Spans and metrics do not go through this subscriber; they are exported by
/// the providers held in [`super::Telemetry`].
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    opentelemetry::global::set_error_handler(log_sdk_error)
        .map_err(|e| anyhow::anyhow!("failed to install OpenTelemetry error handler: {e}"))?;

    Ok(())
}

fn log_sdk_error(err: opentelemetry::global::Error) {
    warn!(error = %err, "opentelemetry sdk error");
}
