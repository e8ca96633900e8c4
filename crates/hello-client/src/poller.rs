//! Periodic driver for [`HelloClient`].
//!
//! The first request fires immediately, then one per period. Non-fatal
//! failures are logged and the loop carries on with no back-off. The loop
//! exits when its [`CancellationToken`] is cancelled or on a fatal error.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::HelloClient;

/// Default delay between two requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome counts of a finished poll loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    /// Requests issued.
    pub sent: u64,
    /// Requests that got any HTTP response back.
    pub succeeded: u64,
    /// Requests that failed before a response arrived.
    pub failed: u64,
}

/// Issues `GET url` every `period` until cancelled.
#[derive(Clone)]
pub struct Poller {
    client: HelloClient,
    url: String,
    period: Duration,
}

impl Poller {
    pub fn new(client: HelloClient, url: impl Into<String>, period: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            period,
        }
    }

    /// Run the loop on the current task until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> PollSummary {
        let mut ticker = time::interval(self.period);
        // A slow request must not cause a burst of catch-up requests.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = PollSummary::default();
        info!(url = %self.url, period_ms = self.period.as_millis() as u64, "poller started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            summary.sent += 1;
            match self.client.send_request(&self.url).await {
                Ok(_) => summary.succeeded += 1,
                Err(e) if e.is_fatal() => {
                    summary.failed += 1;
                    error!(error = %e, "client request failed, poller giving up");
                    break;
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(error = %e, "client request failed");
                }
            }
        }

        info!(
            sent = summary.sent,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "poller stopped"
        );
        summary
    }

    /// Spawn [`Poller::run`] as a background task.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<PollSummary> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
