//! Process body: serve, poll, stop, flush.
//!
//! [`run`] always hands the telemetry pipeline its final flush before it
//! returns, whichever way the server or the stop signal ended.

use std::future::Future;
use std::io;

use anyhow::{Context, Result};
use common::protocol::hello_url;
use hello_client::{HelloClient, Poller};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::server::Server;
use crate::telemetry::Telemetry;

/// Serve `GET /hello` and poll it until `stop` resolves or the server fails,
/// then shut `telemetry` down.
///
/// The first error wins: server, then stop signal, then poller, then
/// telemetry shutdown.
///
/// # Errors
///
/// Returns an error if the server cannot start or stops abnormally, if
/// `stop` resolves to an error, or if telemetry cannot be flushed.
pub async fn run<F>(cfg: &Config, telemetry: Telemetry, stop: F) -> Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let outcome = serve_and_poll(cfg, &telemetry, stop).await;

    let flushed = tokio::task::spawn_blocking(move || telemetry.shutdown())
        .await
        .context("telemetry shutdown task panicked")
        .and_then(|result| result.context("telemetry shutdown failed"));
    if let Err(e) = &flushed {
        error!(error = %e, "telemetry was not flushed");
    }

    outcome.and(flushed)
}

async fn serve_and_poll<F>(cfg: &Config, telemetry: &Telemetry, stop: F) -> Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let shutdown = CancellationToken::new();
    let mut server = Server::new(telemetry, cfg.listen_addr())
        .context("could not create server")?
        .spawn(shutdown.clone())
        .await
        .context("could not start server")?;

    let url = hello_url("localhost", server.local_addr().port());
    let poller = Poller::new(HelloClient::new(cfg.request_timeout()), url, cfg.poll_interval())
        .spawn(shutdown.clone());

    let (stopped, finished) = tokio::select! {
        signal = stop => (signal.context("failed to wait for the stop signal"), None),
        result = server.wait() => (Ok(()), Some(result)),
    };
    shutdown.cancel();

    let served = match finished {
        Some(result) => result,
        None => {
            info!("stop requested, shutting down");
            server.wait().await
        }
    };
    if let Err(e) = &served {
        error!(error = %e, "server stopped with an error");
    }
    let polled = poller.await.context("poller task panicked");

    served?;
    stopped?;
    polled.map(drop)
}
