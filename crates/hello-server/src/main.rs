//! `hello-server` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Build the telemetry pipeline (stdout exporters) and install the
//!    propagator process-wide.
//! 4. Serve `GET /hello` and poll it once per interval until Ctrl-C or a
//!    server failure, then flush and shut telemetry down (see [`app::run`]).

use anyhow::{Context, Result};
use tracing::info;

use hello_server::app;
use hello_server::config::Config;
use hello_server::telemetry::{self, propagation, Telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Logging
    // -----------------------------------------------------------------------
    telemetry::init_logging(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        service_name = %cfg.service_name,
        "hello-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    let telemetry = Telemetry::stdout(&cfg.telemetry_settings())
        .context("failed to build telemetry pipeline")?;
    propagation::install_global();

    // -----------------------------------------------------------------------
    // 4. Serve and poll until interrupted
    // -----------------------------------------------------------------------
    app::run(&cfg, telemetry, tokio::signal::ctrl_c()).await
}
