//! Wire-level constants shared by the server and the client.

/// The single route served by `hello-server`.
pub const HELLO_PATH: &str = "/hello";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 3333;

/// Service name attached to all telemetry when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "hello";

/// Service version attached to all telemetry when none is configured.
pub const DEFAULT_SERVICE_VERSION: &str = "0.0.0";

/// Build the URL of the hello route on `host:port`.
pub fn hello_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}{HELLO_PATH}")
}
