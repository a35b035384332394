//! Background recovery of inactive members.
//!
//! Every demotion launches one detached task that probes the failed
//! member's `/ping` endpoint at a constant interval until it answers
//! `200 OK`, then reinstates the member. There is no retry cap and no
//! backoff; the loop only ends on success or on cluster shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::selector::Shared;
use crate::transport::{HttpRequest, Transport};

/// Path of the liveness endpoint on every member.
pub const PING_PATH: &str = "/ping";

/// Fixed delay between two probes of the same member.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Result of a single liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint answered exactly 200.
    Alive,
    /// The endpoint answered with any other status.
    Unhealthy,
    /// The exchange could not be completed.
    Failed,
}

/// Probe `<base_url>/ping` once.
pub async fn ping_probe(
    transport: &dyn Transport,
    base_url: &str,
    timeout: Duration,
) -> ProbeResult {
    let url = format!("{base_url}{PING_PATH}");

    match tokio::time::timeout(timeout, transport.send(HttpRequest::get(url.as_str()))).await {
        Ok(Ok(resp)) if resp.status == 200 => ProbeResult::Alive,
        Ok(Ok(resp)) => {
            debug!(status = resp.status, %url, "liveness probe non-200");
            ProbeResult::Unhealthy
        }
        Ok(Err(e)) => {
            debug!(error = %e, %url, "liveness probe failed");
            ProbeResult::Failed
        }
        Err(_) => {
            debug!(%url, "liveness probe timed out");
            ProbeResult::Failed
        }
    }
}

/// The recovery loop for a single member.
pub(crate) async fn run_recovery_loop(
    shared: Arc<Shared>,
    index: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let base_url = shared.member_url(index);
    let interval = shared.options().retry_interval;
    let timeout = shared.options().probe_timeout;
    let mut attempts: u64 = 0;

    debug!(%base_url, ?interval, "recovery loop starting");

    loop {
        if *shutdown.borrow() {
            debug!(%base_url, attempts, "recovery loop shutting down");
            return;
        }

        attempts = attempts.saturating_add(1);
        if ping_probe(shared.transport(), &base_url, timeout).await == ProbeResult::Alive {
            shared.reinstate(index);
            info!(%base_url, attempts, "cluster member is reachable again");
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                debug!(%base_url, attempts, "recovery loop shutting down");
                return;
            }
        }
    }
}
