//! Shared helpers for integration tests: a server wired to in-memory exporters.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use hello_server::telemetry::metrics::{REQUEST_COUNT, REQUEST_DURATION};
use hello_server::{Server, ServerHandle, Telemetry, TelemetrySettings};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::metrics::data::{Histogram, ResourceMetrics, Sum};
use opentelemetry_sdk::testing::metrics::InMemoryMetricsExporter;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    pub handle: ServerHandle,
    pub shutdown: CancellationToken,
    telemetry: Telemetry,
    spans: InMemorySpanExporter,
    metrics: InMemoryMetricsExporter,
}

impl TestServer {
    /// Start a server on `addr` whose telemetry only leaves on explicit flush.
    pub async fn start(addr: SocketAddr) -> Self {
        let spans = InMemorySpanExporter::default();
        let metrics = InMemoryMetricsExporter::default();
        let settings =
            TelemetrySettings::new("hello", "0.0.0").with_export_interval(Duration::from_secs(60));
        let telemetry = Telemetry::with_exporters(&settings, spans.clone(), metrics.clone())
            .expect("telemetry");

        let shutdown = CancellationToken::new();
        let handle = Server::new(&telemetry, addr)
            .expect("server")
            .spawn(shutdown.clone())
            .await
            .expect("spawn");

        Self {
            handle,
            shutdown,
            telemetry,
            spans,
            metrics,
        }
    }

    pub async fn ephemeral() -> Self {
        Self::start(([127, 0, 0, 1], 0).into()).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/hello", self.handle.local_addr())
    }

    pub async fn flush(&self) {
        let telemetry = self.telemetry.clone();
        tokio::task::spawn_blocking(move || telemetry.force_flush())
            .await
            .expect("flush task")
            .expect("flush");
    }

    pub async fn stop(mut self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle.wait())
            .await
            .expect("server stops in time")
            .expect("server stops cleanly");
        let telemetry = self.telemetry;
        tokio::task::spawn_blocking(move || telemetry.shutdown())
            .await
            .expect("shutdown task")
            .expect("shutdown");
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().expect("spans")
    }

    fn latest(&self) -> Vec<ResourceMetrics> {
        self.metrics.get_finished_metrics().expect("metrics")
    }

    pub fn request_count(&self) -> f64 {
        let exports = self.latest();
        exports
            .iter()
            .rev()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .find(|m| m.name == REQUEST_COUNT)
            .and_then(|m| m.data.as_any().downcast_ref::<Sum<f64>>())
            .map(|sum| sum.data_points.iter().map(|dp| dp.value).sum())
            .unwrap_or(0.0)
    }

    /// `(count, min)` of the duration histogram.
    pub fn request_durations(&self) -> (u64, Option<f64>) {
        let exports = self.latest();
        exports
            .iter()
            .rev()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .find(|m| m.name == REQUEST_DURATION)
            .and_then(|m| m.data.as_any().downcast_ref::<Histogram<f64>>())
            .and_then(|h| h.data_points.first())
            .map(|dp| (dp.count, dp.min))
            .unwrap_or((0, None))
    }
}
