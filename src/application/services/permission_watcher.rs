//! Notification permission change observer.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::entities::{Permission, PermissionTransition};

/// Forwards permission transitions from the platform to a dedicated channel.
///
/// Only real changes are reported; repeated values are swallowed.
pub struct PermissionWatcher {
    handle: Option<JoinHandle<()>>,
}

impl PermissionWatcher {
    /// Starts watching. The returned receiver is the observer side.
    #[must_use]
    pub fn spawn(
        mut source: watch::Receiver<Permission>,
    ) -> (Self, mpsc::UnboundedReceiver<PermissionTransition>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut last = *source.borrow_and_update();

        let handle = tokio::spawn(async move {
            while source.changed().await.is_ok() {
                let current = *source.borrow_and_update();
                let Some(transition) = PermissionTransition::between(last, current) else {
                    continue;
                };
                last = current;

                info!(from = %transition.from, to = %transition.to, "Notification permission changed");
                if tx.send(transition).is_err() {
                    break;
                }
            }
            debug!("Permission watcher stopped");
        });

        (
            Self {
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PermissionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
