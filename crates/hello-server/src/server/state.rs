//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_sdk::trace::Tracer;

use crate::telemetry::metrics::RequestInstruments;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable so that Axum can clone the state for
/// each request. The instruments are safe to update from concurrent handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tracer every request span is started from.
    pub tracer: Tracer,
    /// Request counter and duration histogram.
    pub instruments: RequestInstruments,
    /// Reads the caller's trace context and baggage from request headers.
    pub propagator: Arc<TextMapCompositePropagator>,
}

impl AppState {
    pub fn new(
        tracer: Tracer,
        instruments: RequestInstruments,
        propagator: Arc<TextMapCompositePropagator>,
    ) -> Self {
        Self {
            tracer,
            instruments,
            propagator,
        }
    }
}
