//! Single-flight session refresh.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::domain::ports::{HttpMethod, HttpRequest, HttpTransport, SessionPort};

/// Result of a settled refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The session was renewed; replay the request.
    Refreshed,
    /// The session is gone.
    Failed,
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Deduplicates concurrent refresh attempts.
///
/// The first caller starts the refresh; every caller, including the first,
/// parks a waiter that is resolved in registration order when it settles.
/// The refresh runs on its own task, so dropping any caller never strands
/// the others, and a hung refresh is bounded by `timeout`.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    session: Arc<dyn SessionPort>,
    refresh_url: String,
    timeout: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Creates new coordinator.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<dyn SessionPort>,
        refresh_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            session,
            refresh_url: refresh_url.into(),
            timeout,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Waits for a refresh, starting one if none is in flight.
    pub async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();

        let start = {
            let mut state = self.state.lock();
            state.waiters.push(tx);
            if state.in_flight {
                debug!(waiters = state.waiters.len(), "Refresh already in flight, waiting");
                false
            } else {
                state.in_flight = true;
                true
            }
        };

        if start {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = this.perform().await;
                this.settle(outcome);
            });
        }

        rx.await.unwrap_or(RefreshOutcome::Failed)
    }

    /// Returns whether a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Number of callers parked on the in-flight refresh.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    async fn perform(&self) -> RefreshOutcome {
        info!("Refreshing session");

        let request = HttpRequest::new(HttpMethod::Post, self.refresh_url.clone());
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) if response.is_success() => {
                info!("Session refreshed");
                RefreshOutcome::Refreshed
            }
            Ok(Ok(response)) => {
                warn!(status = response.status, "Session refresh rejected");
                RefreshOutcome::Failed
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Session refresh failed");
                RefreshOutcome::Failed
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "Session refresh timed out");
                RefreshOutcome::Failed
            }
        }
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), ?outcome, "Refresh settled");

        if outcome == RefreshOutcome::Failed {
            self.session.force_logout();
        }

        for waiter in waiters {
            let _ = waiter.send(outcome);
        }
    }
}
