//! Error taxonomy and wire constants shared across `hello-otel` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
