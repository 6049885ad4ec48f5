//! System notifications with conditional compilation.

use crate::domain::entities::PushPayload;
use crate::domain::ports::NotificationPort;

/// Desktop notification service.
#[cfg(feature = "notify")]
mod notify_impl {
    use super::*;
    use notify_rust::Notification;
    use tracing::{debug, warn};

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotificationService {
        enabled: bool,
    }

    impl DesktopNotificationService {
        #[must_use]
        pub const fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn display(&self, payload: &PushPayload) {
            if !self.enabled {
                debug!(tag = %payload.tag, "Desktop notifications disabled, skipping");
                return;
            }

            let payload = payload.clone();

            tokio::task::spawn_blocking(move || {
                if let Err(e) = Notification::new()
                    .summary(&payload.title)
                    .body(&payload.body)
                    .icon(&payload.icon)
                    .appname("Pushwire")
                    .show()
                {
                    warn!(error = %e, "Failed to show notification");
                }
            });
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_disabled_service_is_silent() {
            let service = DesktopNotificationService::new(false);
            assert!(!service.is_enabled());
            service.display(&PushPayload::default());
        }
    }
}

/// Stub notification service when notify feature is disabled.
#[cfg(not(feature = "notify"))]
mod stub_impl {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotificationService {
        _enabled: bool,
    }

    impl DesktopNotificationService {
        #[must_use]
        pub const fn new(_enabled: bool) -> Self {
            Self { _enabled: false }
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            false
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn display(&self, payload: &PushPayload) {
            tracing::info!(title = %payload.title, body = %payload.body, "Push received");
        }
    }
}

#[cfg(feature = "notify")]
pub use notify_impl::DesktopNotificationService;
#[cfg(not(feature = "notify"))]
pub use stub_impl::DesktopNotificationService;
