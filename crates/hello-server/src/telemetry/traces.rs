//! Trace pipeline: span exporter behind a batching span processor.

use std::time::Duration;

use common::ServiceError;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, Config, TracerProvider};
use opentelemetry_sdk::Resource;

/// Name of the tracer the server opens request spans with.
pub const TRACER_NAME: &str = "hello-trace";

/// Span exporter writing pretty-printed JSON to stdout.
///
/// # Errors
///
/// Construction cannot fail for stdout; the `Result` matches the other sinks
/// this slot may be filled with.
pub fn stdout_exporter() -> Result<opentelemetry_stdout::SpanExporter, ServiceError> {
    Ok(opentelemetry_stdout::SpanExporter::builder()
        .with_encoder(|writer, data| {
            serde_json::to_writer_pretty(writer, &data).map_err(|e| TraceError::Other(Box::new(e)))
        })
        .build())
}

/// Build a tracer provider that buffers finished spans and hands them to
/// `exporter` every `interval` (or sooner if a batch fills up).
///
/// Must be called from within a Tokio runtime: the batch worker is spawned
/// immediately.
pub fn provider<E>(exporter: E, resource: Resource, interval: Duration) -> TracerProvider
where
    E: SpanExporter + 'static,
{
    let batch_config = BatchConfigBuilder::default()
        .with_scheduled_delay(interval)
        .build();
    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio)
        .with_batch_config(batch_config)
        .build();

    TracerProvider::builder()
        .with_span_processor(processor)
        .with_config(Config::default().with_resource(resource))
        .build()
}
