//! `hello-server` — a single instrumented HTTP route.
//!
//! [`telemetry`] builds the resource, the trace and metric pipelines, and the
//! propagator; [`server`] serves `GET /hello`, recording a span, a call count,
//! and a duration for every request. [`app::run`] ties both to the polling
//! client for the binary.

pub mod app;
pub mod config;
pub mod server;
pub mod telemetry;

pub use server::{BoundServer, Server, ServerHandle};
pub use telemetry::{Telemetry, TelemetrySettings};
