//! Axum HTTP server for the instrumented hello route.
//!
//! # Lifecycle
//!
//! 1. [`Server::new`] wires the tracer, instruments, and propagator from a
//!    [`Telemetry`] into [`AppState`] (state: constructed).
//! 2. [`Server::bind`] binds the TCP listener. Once it returns, connections
//!    are accepted, so callers can start issuing requests without guessing.
//! 3. [`BoundServer::serve`] / [`BoundServer::serve_until`] run the accept
//!    loop (state: serving). [`Server::spawn`] does 2 and 3 on a Tokio task.

pub mod handlers;
pub mod router;
pub mod state;

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::Router;
use common::ServiceError;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::telemetry::metrics::RequestInstruments;
use crate::telemetry::Telemetry;
use state::AppState;

/// A fully wired server that is not listening yet.
pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Wire a server for `addr` from `telemetry`.
    ///
    /// The tracer handle comes from `telemetry`; instruments are registered
    /// here, after every provider exists.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Construction`] if instrument registration
    /// fails; no partially instrumented server is returned.
    pub fn new(telemetry: &Telemetry, addr: SocketAddr) -> Result<Self, ServiceError> {
        let tracer = telemetry.tracer();
        let instruments = RequestInstruments::register(telemetry.meter_provider())?;
        let state = AppState::new(tracer, instruments, telemetry.propagator());
        Ok(Self { addr, state })
    }

    /// Bind the listener. Port `0` picks an ephemeral port.
    ///
    /// On hosts without IPv6, `[::]` falls back to `0.0.0.0` on the same port.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if the address cannot be bound.
    pub async fn bind(self) -> Result<BoundServer, ServiceError> {
        let listener = match TcpListener::bind(self.addr).await {
            Ok(listener) => listener,
            Err(e) if self.addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED)
                && e.kind() != io::ErrorKind::AddrInUse =>
            {
                let fallback = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.addr.port()));
                warn!(error = %e, addr = %fallback, "IPv6 unavailable, listening on IPv4 only");
                TcpListener::bind(fallback).await.map_err(|e| bind_error(fallback, e))?
            }
            Err(e) => return Err(bind_error(self.addr, e)),
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Transport(format!("failed to read bound address: {e}")))?;
        info!(addr = %local_addr, "listening");

        Ok(BoundServer {
            listener,
            local_addr,
            router: router::build(self.state),
        })
    }

    /// Bind, then serve on a background task until `shutdown` is cancelled.
    ///
    /// The returned handle is only produced after the listener is bound.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if binding fails. Errors from the
    /// serve loop itself come back through [`ServerHandle::wait`].
    pub async fn spawn(self, shutdown: CancellationToken) -> Result<ServerHandle, ServiceError> {
        let bound = self.bind().await?;
        let local_addr = bound.local_addr();
        let task = tokio::spawn(bound.serve_until(shutdown));
        Ok(ServerHandle { local_addr, task })
    }
}

fn bind_error(addr: SocketAddr, e: io::Error) -> ServiceError {
    ServiceError::Transport(format!("failed to bind {addr}: {e}"))
}

/// A server whose listener is bound and accepting connections.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the transport fails. Does not return otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] on an unrecoverable I/O error.
    pub async fn serve(self) -> Result<(), ServiceError> {
        axum::serve(self.listener, self.router)
            .await
            .map_err(|e| ServiceError::Transport(format!("server error: {e}")))
    }

    /// Serve until `shutdown` is cancelled, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] on an unrecoverable I/O error.
    pub async fn serve_until(self, shutdown: CancellationToken) -> Result<(), ServiceError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServiceError::Transport(format!("server error: {e}")))?;
        info!(addr = %self.local_addr, "server stopped");
        Ok(())
    }
}

/// Handle to a server running on a background task.
pub struct ServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<Result<(), ServiceError>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the serve task to finish. Call at most once.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or [`ServiceError::Transport`] if the
    /// task panicked or was aborted.
    pub async fn wait(&mut self) -> Result<(), ServiceError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(ServiceError::Transport(format!("server task failed: {e}"))),
        }
    }
}
