//! Metric pipeline and the two request instruments.
//!
//! | instrument         | kind            | unit     |
//! |--------------------|-----------------|----------|
//! | `request.count`    | f64 counter     | `{call}` |
//! | `request.duration` | f64 histogram   | `sec`    |

use std::time::Duration;

use common::ServiceError;
use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _, Unit};
use opentelemetry_sdk::metrics::exporter::PushMetricsExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::{runtime, Resource};

/// Meter the request instruments are registered under.
pub const METER_NAME: &str = "http-metrics";
/// Instrumentation version reported with [`METER_NAME`].
pub const METER_VERSION: &str = "v0.0.0";

pub const REQUEST_COUNT: &str = "request.count";
pub const REQUEST_DURATION: &str = "request.duration";

/// Metrics exporter writing JSON to stdout.
///
/// # Errors
///
/// Construction cannot fail for stdout; see [`super::traces::stdout_exporter`].
pub fn stdout_exporter() -> Result<opentelemetry_stdout::MetricsExporter, ServiceError> {
    Ok(opentelemetry_stdout::MetricsExporter::default())
}

/// Build a meter provider whose reader collects every `interval` and pushes
/// the result to `exporter`.
///
/// Must be called from within a Tokio runtime.
pub fn provider<E>(exporter: E, resource: Resource, interval: Duration) -> SdkMeterProvider
where
    E: PushMetricsExporter,
{
    let reader = PeriodicReader::builder(exporter, runtime::Tokio)
        .with_interval(interval)
        .build();

    SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build()
}

/// Per-request instruments. Cloning shares the underlying instruments.
#[derive(Clone)]
pub struct RequestInstruments {
    request_count: Counter<f64>,
    request_duration: Histogram<f64>,
}

impl RequestInstruments {
    /// Register `request.count` and `request.duration` on the `http-metrics`
    /// meter of `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Construction`] if the SDK rejects either
    /// instrument. Callers must abort rather than run half-instrumented.
    pub fn register(provider: &SdkMeterProvider) -> Result<Self, ServiceError> {
        let meter = provider.versioned_meter(
            METER_NAME,
            Some(METER_VERSION),
            None::<&'static str>,
            None,
        );

        let request_count = meter
            .f64_counter(REQUEST_COUNT)
            .with_description("Number of HTTP requests")
            .with_unit(Unit::new("{call}"))
            .try_init()
            .map_err(|e| ServiceError::Construction(format!("{REQUEST_COUNT}: {e}")))?;

        let request_duration = meter
            .f64_histogram(REQUEST_DURATION)
            .with_description("Duration of request execution")
            .with_unit(Unit::new("sec"))
            .try_init()
            .map_err(|e| ServiceError::Construction(format!("{REQUEST_DURATION}: {e}")))?;

        Ok(Self {
            request_count,
            request_duration,
        })
    }

    /// Record one handled request that took `elapsed`.
    ///
    /// The duration goes in first, then the counter moves by exactly one.
    pub fn record(&self, elapsed: Duration) {
        self.request_duration.record(elapsed.as_secs_f64(), &[]);
        self.request_count.add(1.0, &[]);
    }
}
