//! Client side of `hello-otel`: a best-effort GET against the hello route and
//! a cancellable loop that issues it on a fixed period.

pub mod client;
pub mod config;
pub mod logging;
pub mod poller;

pub use client::HelloClient;
pub use poller::{PollSummary, Poller};
