//! Service identity attached to every exported span and metric.

use common::ServiceError;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

/// Semantic-conventions schema the resource attributes follow.
pub const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.17.0";

/// Build the resource descriptor for `service_name` at `service_version`.
///
/// Inputs are stored verbatim; no validation happens here.
///
/// # Errors
///
/// None in-process. The `Result` leaves room for resolving the schema
/// remotely without changing callers.
pub fn build(service_name: &str, service_version: &str) -> Result<Resource, ServiceError> {
    Ok(Resource::from_schema_url(
        [
            KeyValue::new(SERVICE_NAME, service_name.to_owned()),
            KeyValue::new(SERVICE_VERSION, service_version.to_owned()),
        ],
        SCHEMA_URL,
    ))
}
