//! Axum request handlers.

use std::time::Instant;

use axum::{extract::State, http::HeaderMap, http::StatusCode};
use common::protocol::HELLO_PATH;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{Span, SpanKind, Tracer};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::trace::HTTP_ROUTE;
use tracing::info;

use super::state::AppState;
use crate::telemetry::propagation::HeaderExtractor;

/// Name of the span opened for every hello request.
pub const SPAN_NAME: &str = "hello-trace";

/// `GET /hello` — the instrumented route.
///
/// Opens a server span under the caller's propagated context, times the
/// handler body, records the duration and one call, then ends the span.
/// Responds with the default `200 OK` and an empty body.
pub async fn hello(State(state): State<AppState>, headers: HeaderMap) {
    let parent = state.propagator.extract(&HeaderExtractor(&headers));
    // Dropping `span` ends it, so it is closed on every exit path.
    let mut span = state
        .tracer
        .span_builder(SPAN_NAME)
        .with_kind(SpanKind::Server)
        .with_attributes([KeyValue::new(HTTP_ROUTE, HELLO_PATH)])
        .start_with_context(&state.tracer, &parent);

    let start = Instant::now();
    info!("hello");
    let elapsed = start.elapsed();

    state.instruments.record(elapsed);
    span.end();
}

/// Catch-all 404 handler.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
