//! Configuration loading and validation for the standalone poller.

use std::time::Duration;

use anyhow::{Context, Result};
use common::ServiceError;
use serde::Deserialize;

use crate::poller::DEFAULT_POLL_INTERVAL;

/// Validated poller configuration, read from `HELLO_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL requested on every tick.
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Delay between two requests, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_target_url() -> String {
    common::protocol::hello_url("localhost", common::protocol::DEFAULT_PORT)
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_request_timeout_ms() -> u64 {
    2000
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("HELLO"))
            .build()
            .context("failed to build hello-client configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise hello-client configuration")?;

        c.validate()?;
        Ok(c)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.target_url.trim().is_empty() {
            return Err(ServiceError::Config(
                "HELLO_TARGET_URL is required and must not be empty".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ServiceError::Config("HELLO_POLL_INTERVAL_MS must be > 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ServiceError::Config("HELLO_REQUEST_TIMEOUT_MS must be > 0".into()));
        }
        Ok(())
    }
}
