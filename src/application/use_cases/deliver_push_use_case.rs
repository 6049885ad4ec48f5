//! Push message delivery use case.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::PushPayload;
use crate::domain::ports::NotificationPort;

/// Turns a received push message into a system notification.
#[derive(Clone)]
pub struct DeliverPushUseCase {
    notifier: Arc<dyn NotificationPort>,
}

impl DeliverPushUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(notifier: Arc<dyn NotificationPort>) -> Self {
        Self { notifier }
    }

    /// Parses and displays the raw push data.
    ///
    /// Returns the displayed payload, or `None` when the message was empty.
    pub fn execute(&self, raw: &[u8]) -> Option<PushPayload> {
        let Some(payload) = PushPayload::parse(raw) else {
            debug!("Ignoring empty push message");
            return None;
        };

        info!(title = %payload.title, tag = %payload.tag, "Displaying push notification");
        self.notifier.display(&payload);
        Some(payload)
    }
}
