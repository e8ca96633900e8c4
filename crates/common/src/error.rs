//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants follow the startup/runtime split:
/// - [`ServiceError::Construction`], [`ServiceError::Config`] → abort startup
/// - [`ServiceError::Transport`] → ends the server task
/// - [`ServiceError::Request`] → logged by the poller, loop continues
/// - [`ServiceError::Shutdown`] → reported on exit
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Resource, provider, or instrument setup failed.
    #[error("telemetry construction failed: {0}")]
    Construction(String),

    /// Configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The server could not bind or the accept loop failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A client request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// Buffered telemetry could not be flushed or the providers failed to stop.
    #[error("telemetry shutdown failed: {0}")]
    Shutdown(String),
}

impl ServiceError {
    /// Whether this error must terminate the process (or task) that hit it.
    pub fn is_fatal(&self) -> bool {
        match self {
            ServiceError::Construction(_) => true,
            ServiceError::Config(_) => true,
            ServiceError::Transport(_) => true,
            ServiceError::Request(_) => false,
            ServiceError::Shutdown(_) => false,
        }
    }
}
