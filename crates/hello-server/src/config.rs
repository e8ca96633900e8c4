//! Configuration loading and validation for the hello service.
//!
//! All values are read from `HELLO_*` environment variables at startup and
//! fall back to the defaults below. The process exits with a clear error
//! message if any value is present but invalid.

use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use common::protocol::{DEFAULT_PORT, DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION};
use common::ServiceError;
use hello_client::poller::DEFAULT_POLL_INTERVAL;
use serde::Deserialize;

use crate::telemetry::TelemetrySettings;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on, on all interfaces.
    #[serde(default = "default_port")]
    pub port: u16,

    /// `service.name` resource attribute.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// `service.version` resource attribute.
    #[serde(default = "default_service_version")]
    pub service_version: String,

    /// How often (seconds) spans are flushed and metrics collected.
    #[serde(default = "default_export_interval")]
    pub export_interval_secs: u64,

    /// How often (milliseconds) the built-in client calls the server.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Per-request timeout (milliseconds) of the built-in client.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.into()
}
fn default_service_version() -> String {
    DEFAULT_SERVICE_VERSION.into()
}
fn default_export_interval() -> u64 {
    5
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_request_timeout() -> u64 {
    2000
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            service_name: default_service_name(),
            service_version: default_service_version(),
            export_interval_secs: default_export_interval(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_ms: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("HELLO"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Address the server binds: every interface, configured port.
    ///
    /// `[::]` accepts IPv4 connections too on dual-stack hosts, so
    /// `localhost` works whichever family it resolves to first.
    pub fn listen_addr(&self) -> SocketAddr {
        (Ipv6Addr::UNSPECIFIED, self.port).into()
    }

    pub fn telemetry_settings(&self) -> TelemetrySettings {
        TelemetrySettings::new(&self.service_name, &self.service_version)
            .with_export_interval(Duration::from_secs(self.export_interval_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<(), ServiceError> {
        if self.service_name.trim().is_empty() {
            return Err(ServiceError::Config("HELLO_SERVICE_NAME must not be empty".into()));
        }
        if self.export_interval_secs == 0 {
            return Err(ServiceError::Config("HELLO_EXPORT_INTERVAL_SECS must be > 0".into()));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_port(), 3333);
        assert_eq!(default_service_name(), "hello");
        assert_eq!(default_service_version(), "0.0.0");
        assert_eq!(default_export_interval(), 5);
        assert_eq!(default_poll_interval(), 1000);
        assert_eq!(default_request_timeout(), 2000);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.listen_addr().to_string(), "[::]:3333");
    }

    #[test]
    fn telemetry_settings_follow_config() {
        let cfg = Config {
            service_name: "checkout".into(),
            service_version: "1.2.3".into(),
            export_interval_secs: 10,
            ..Config::default()
        };
        let settings = cfg.telemetry_settings();
        assert_eq!(settings.service_name, "checkout");
        assert_eq!(settings.service_version, "1.2.3");
        assert_eq!(settings.export_interval, Duration::from_secs(10));
    }

    #[test]
    fn validate_rejects_empty_service_name() {
        let cfg = Config {
            service_name: " ".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_export_interval() {
        let cfg = Config {
            export_interval_secs: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_request_timeout() {
        let cfg = Config {
            request_timeout_ms: 0,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn from_env_parses_numeric_strings() {
        std::env::set_var("HELLO_PORT", "4000");
        std::env::set_var("HELLO_SERVICE_NAME", "checkout");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.service_name, "checkout");
        assert_eq!(cfg.export_interval_secs, 5);

        std::env::set_var("HELLO_PORT", "70000");
        assert!(Config::from_env().is_err());

        std::env::remove_var("HELLO_PORT");
        std::env::remove_var("HELLO_SERVICE_NAME");
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let cfg = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
