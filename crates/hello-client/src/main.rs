//! `hello-client` — standalone poller entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Poll the target URL until Ctrl-C.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use hello_client::config::Config;
use hello_client::{logging, HelloClient, Poller};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: hello-client configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Logging
    // -----------------------------------------------------------------------
    logging::init(&cfg.log_level)?;
    info!(target_url = %cfg.target_url, "hello-client starting");

    // -----------------------------------------------------------------------
    // 3. Poll loop
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    let client = HelloClient::new(cfg.request_timeout());
    let poller = Poller::new(client, cfg.target_url.clone(), cfg.poll_interval())
        .spawn(cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("interrupt received, stopping poller");
    cancel.cancel();

    let summary = poller.await.context("poller task panicked")?;
    info!(
        sent = summary.sent,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "poller stopped"
    );
    Ok(())
}
