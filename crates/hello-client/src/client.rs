//! Best-effort HTTP GET against the hello route.
//!
//! Failures are not retried and not classified: connection refused, DNS
//! failure, and timeout all surface as [`ServiceError::Request`] with a
//! description. Any response, including a non-2xx one, counts as success and
//! its status is handed back to the caller.

use std::error::Error as _;
use std::time::Duration;

use bytes::Bytes;
use common::ServiceError;
use http_body_util::Empty;
use hyper::{StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tracing::info;

/// Upper bound on a single request, connection setup included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Plain HTTP/1 client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HelloClient {
    inner: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl HelloClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let inner = Client::builder(TokioExecutor::new()).build_http();
        Self { inner, timeout }
    }

    /// Issue `GET url`, discard the body, and return the response status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Request`] if the URL does not parse, the
    /// connection or exchange fails, or no response arrives within the
    /// configured timeout.
    pub async fn send_request(&self, url: &str) -> Result<StatusCode, ServiceError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ServiceError::Request(format!("invalid URL {url}: {e}")))?;

        let response = match tokio::time::timeout(self.timeout, self.inner.get(uri)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ServiceError::Request(format!(
                    "error making HTTP request to {url}: {}",
                    describe(&e)
                )))
            }
            Err(_) => {
                return Err(ServiceError::Request(format!(
                    "HTTP request to {url} timed out after {:?}",
                    self.timeout
                )))
            }
        };

        let status = response.status();
        info!(status = status.as_u16(), "client: got response");
        Ok(status)
    }
}

impl Default for HelloClient {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Flatten an error and its sources into one line.
///
/// The legacy client's top-level error only says which phase failed; the
/// underlying io error sits further down the chain.
fn describe(err: &hyper_util::client::legacy::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
