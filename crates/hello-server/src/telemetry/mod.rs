//! OpenTelemetry bootstrap: resource, trace and metric providers, propagator.
//!
//! Everything is owned by one [`Telemetry`] value built at startup and handed
//! to the server explicitly. No tracer or meter provider is installed
//! globally; only the propagator is, see [`propagation::install_global`].
//!
//! # Telemetry invariants
//!
//! - Both providers carry the same [`opentelemetry_sdk::Resource`].
//! - Spans are batched and metrics collected on the same fixed interval
//!   (default 5 s).
//! - Buffered data is only guaranteed to reach the sink after
//!   [`Telemetry::shutdown`].
//! - Providers are shut down exactly once, when the last handle drops. SDK
//!   errors raised after that point go through [`init::init_logging`]'s
//!   error handler into the log stream.

pub mod init;
pub mod metrics;
pub mod propagation;
pub mod resource;
pub mod traces;

use std::sync::Arc;
use std::time::Duration;

use common::protocol::{DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION};
use common::ServiceError;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::metrics::exporter::PushMetricsExporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{debug, info};

pub use init::init_logging;

/// Interval at which spans are flushed and metrics collected.
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Inputs to the telemetry bootstrap.
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub service_version: String,
    pub export_interval: Duration,
}

impl TelemetrySettings {
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            export_interval: DEFAULT_EXPORT_INTERVAL,
        }
    }

    pub fn with_export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = interval;
        self
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION)
    }
}

/// One process-wide telemetry configuration.
///
/// Cheap to clone: providers and propagator are reference-counted.
#[derive(Clone)]
pub struct Telemetry {
    resource: Resource,
    tracer_provider: TracerProvider,
    tracer: Tracer,
    meter_provider: SdkMeterProvider,
    propagator: Arc<TextMapCompositePropagator>,
}

impl Telemetry {
    /// Build the pipeline with both exporters writing to stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Construction`] if any stage fails.
    pub fn stdout(settings: &TelemetrySettings) -> Result<Self, ServiceError> {
        let span_exporter = traces::stdout_exporter()?;
        let metrics_exporter = metrics::stdout_exporter()?;
        Self::with_exporters(settings, span_exporter, metrics_exporter)
    }

    /// Build the pipeline around caller-supplied exporters.
    ///
    /// Order: resource, trace provider, request tracer, meter provider,
    /// propagator. Must run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Construction`] if any stage fails.
    pub fn with_exporters<S, M>(
        settings: &TelemetrySettings,
        span_exporter: S,
        metrics_exporter: M,
    ) -> Result<Self, ServiceError>
    where
        S: SpanExporter + 'static,
        M: PushMetricsExporter,
    {
        let resource = resource::build(&settings.service_name, &settings.service_version)?;
        let tracer_provider =
            traces::provider(span_exporter, resource.clone(), settings.export_interval);
        let tracer = tracer_provider.tracer(traces::TRACER_NAME);
        let meter_provider =
            metrics::provider(metrics_exporter, resource.clone(), settings.export_interval);

        debug!(
            service_name = %settings.service_name,
            service_version = %settings.service_version,
            export_interval_ms = settings.export_interval.as_millis() as u64,
            "telemetry pipeline built"
        );

        Ok(Self {
            resource,
            tracer_provider,
            tracer,
            meter_provider,
            propagator: Arc::new(propagation::composite()),
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    pub fn propagator(&self) -> Arc<TextMapCompositePropagator> {
        Arc::clone(&self.propagator)
    }

    /// The `hello-trace` tracer request spans are opened with.
    pub fn tracer(&self) -> Tracer {
        self.tracer.clone()
    }

    /// Push everything buffered so far to the exporters.
    ///
    /// Blocks until the SDK workers acknowledge; call it through
    /// `tokio::task::spawn_blocking` on a multi-threaded runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Shutdown`] listing every failed flush.
    pub fn force_flush(&self) -> Result<(), ServiceError> {
        let mut failures = self.flush_traces();
        if let Err(e) = self.meter_provider.force_flush() {
            failures.push(format!("metrics: {e}"));
        }
        into_result(failures)
    }

    /// Final flush, then release this handle.
    ///
    /// Everything buffered is exported before this returns. Dropping the last
    /// handle stops the batch span worker and the periodic reader; the reader
    /// runs one more collection on the way out. Same blocking rules as
    /// [`Telemetry::force_flush`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Shutdown`] listing every failed flush.
    pub fn shutdown(self) -> Result<(), ServiceError> {
        let result = self.force_flush();
        drop(self);
        if result.is_ok() {
            info!("telemetry flushed and shut down");
        }
        result
    }

    fn flush_traces(&self) -> Vec<String> {
        self.tracer_provider
            .force_flush()
            .into_iter()
            .filter_map(Result::err)
            .map(|e| format!("traces: {e}"))
            .collect()
    }
}

fn into_result(failures: Vec<String>) -> Result<(), ServiceError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Shutdown(failures.join("; ")))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory exporters wired into a [`Telemetry`] for assertions.
    //!
    //! The SDK's in-memory exporters clear themselves on shutdown; the
    //! wrappers here keep what was exported so shutdown can be observed.

    use super::*;
    use async_trait::async_trait;
    use opentelemetry::metrics::Result as MetricsResult;
    use opentelemetry_sdk::export::trace::{ExportResult, SpanData};
    use opentelemetry_sdk::metrics::data::{self, Metric, ResourceMetrics, Temporality};
    use opentelemetry_sdk::metrics::reader::{AggregationSelector, TemporalitySelector};
    use opentelemetry_sdk::metrics::{Aggregation, InstrumentKind};
    use opentelemetry_sdk::testing::metrics::InMemoryMetricsExporter;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use std::future::Future;
    use std::ops::Deref;
    use std::pin::Pin;

    #[derive(Debug, Clone, Default)]
    pub(crate) struct RetainedSpans(InMemorySpanExporter);

    impl SpanExporter for RetainedSpans {
        fn export(
            &mut self,
            batch: Vec<SpanData>,
        ) -> Pin<Box<dyn Future<Output = ExportResult> + Send + 'static>> {
            self.0.export(batch)
        }
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct RetainedMetrics(InMemoryMetricsExporter);

    impl AggregationSelector for RetainedMetrics {
        fn aggregation(&self, kind: InstrumentKind) -> Aggregation {
            self.0.aggregation(kind)
        }
    }

    impl TemporalitySelector for RetainedMetrics {
        fn temporality(&self, kind: InstrumentKind) -> Temporality {
            self.0.temporality(kind)
        }
    }

    #[async_trait]
    impl PushMetricsExporter for RetainedMetrics {
        async fn export(&self, metrics: &mut ResourceMetrics) -> MetricsResult<()> {
            self.0.export(metrics).await
        }

        async fn force_flush(&self) -> MetricsResult<()> {
            self.0.force_flush().await
        }

        fn shutdown(&self) -> MetricsResult<()> {
            Ok(())
        }
    }

    pub(crate) struct HistogramSnapshot {
        pub count: u64,
        pub sum: f64,
        pub min: Option<f64>,
    }

    /// Everything the exporters have received so far.
    pub(crate) struct Captured {
        spans: RetainedSpans,
        metrics: RetainedMetrics,
    }

    impl Captured {
        pub fn finished_spans(&self) -> Vec<SpanData> {
            self.spans.0.get_finished_spans().expect("finished spans")
        }

        /// Number of metric exports that reached the exporter.
        pub fn metric_exports(&self) -> usize {
            self.exports().len()
        }

        fn exports(&self) -> Vec<ResourceMetrics> {
            self.metrics.0.get_finished_metrics().expect("finished metrics")
        }

        fn with_latest<T>(&self, name: &str, f: impl Fn(&Metric, &str) -> T) -> Option<T> {
            let exports = self.exports();
            exports
                .iter()
                .rev()
                .flat_map(|rm| rm.scope_metrics.iter())
                .flat_map(|sm| sm.metrics.iter().map(move |m| (m, &*sm.scope.name)))
                .find(|(m, _)| m.name == name)
                .map(|(m, scope)| f(m, scope))
        }

        pub fn counter_total(&self, name: &str) -> Option<f64> {
            self.with_latest(name, |m, _| {
                m.data
                    .as_any()
                    .downcast_ref::<data::Sum<f64>>()
                    .map(|sum| sum.data_points.iter().map(|dp| dp.value).sum())
            })
            .flatten()
        }

        pub fn histogram(&self, name: &str) -> Option<HistogramSnapshot> {
            self.with_latest(name, |m, _| {
                m.data
                    .as_any()
                    .downcast_ref::<data::Histogram<f64>>()
                    .and_then(|h| h.data_points.first())
                    .map(|dp| HistogramSnapshot {
                        count: dp.count,
                        sum: dp.sum,
                        min: dp.min,
                    })
            })
            .flatten()
        }

        pub fn description(&self, name: &str) -> Option<String> {
            self.with_latest(name, |m, _| m.description.to_string())
        }

        pub fn scope_name(&self, name: &str) -> Option<String> {
            self.with_latest(name, |_, scope| scope.to_owned())
        }
    }

    pub(crate) struct TestTelemetry {
        pub telemetry: Telemetry,
        captured: Captured,
    }

    impl Deref for TestTelemetry {
        type Target = Captured;

        fn deref(&self) -> &Captured {
            &self.captured
        }
    }

    impl TestTelemetry {
        /// Long interval so nothing is exported unless a test flushes.
        pub fn new() -> Self {
            let spans = RetainedSpans::default();
            let metrics = RetainedMetrics::default();
            let settings = TelemetrySettings::new("hello-test", "0.0.0")
                .with_export_interval(Duration::from_secs(60));
            let telemetry = Telemetry::with_exporters(&settings, spans.clone(), metrics.clone())
                .expect("in-memory telemetry");
            Self {
                telemetry,
                captured: Captured { spans, metrics },
            }
        }

        pub async fn flush(&self) {
            let telemetry = self.telemetry.clone();
            tokio::task::spawn_blocking(move || telemetry.force_flush())
                .await
                .expect("flush task")
                .expect("flush");
        }

        /// Split into a pipeline to hand over and the exports to inspect.
        pub fn into_parts(self) -> (Telemetry, Captured) {
            (self.telemetry, self.captured)
        }

        /// Shut the pipeline down and hand back what it exported.
        pub async fn shutdown(self) -> Captured {
            let telemetry = self.telemetry;
            tokio::task::spawn_blocking(move || telemetry.shutdown())
                .await
                .expect("shutdown task")
                .expect("shutdown");
            self.captured
        }
    }
}
