//! Context propagation across HTTP boundaries.
//!
//! The composite propagator runs W3C trace context first and baggage second,
//! so `traceparent`/`tracestate` are parsed before `baggage`.

use axum::http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Build the trace-context + baggage propagator.
pub fn composite() -> TextMapCompositePropagator {
    let propagators: Vec<Box<dyn TextMapPropagator + Send + Sync>> = vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ];
    TextMapCompositePropagator::new(propagators)
}

/// Install [`composite`] as the process-wide default propagator.
///
/// Nothing in this crate reads the global; it is there for libraries that do.
pub fn install_global() {
    opentelemetry::global::set_text_map_propagator(composite());
}

/// Read-only view of request headers for [`TextMapPropagator::extract`].
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}
