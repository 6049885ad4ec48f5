//! User-facing text.

use crate::application::ToggleOutcome;
use crate::domain::entities::LifecycleEvent;

const DEFAULT_MESSAGE: &str = "Something went wrong. Please try again shortly.";

/// Text for an error code, falling back to the server message and then a generic one.
#[must_use]
pub fn error_message<'a>(code: Option<&str>, fallback: Option<&'a str>) -> &'a str {
    let known = match code {
        Some("AUTH_REQUIRED") => Some("You need to sign in to use this."),
        Some("INVALID_PARAMETER") => Some("Some of the input is not valid."),
        Some("USER_NOT_FOUND") => Some("That user does not exist."),
        Some("NETWORK_ERROR") => Some("The network connection is unstable."),
        Some("SESSION_EXPIRED") => Some("Your session has expired. Please sign in again."),
        _ => None,
    };

    known
        .or(fallback.filter(|m| !m.trim().is_empty()))
        .unwrap_or(DEFAULT_MESSAGE)
}

/// One-line description of a lifecycle event.
#[must_use]
pub fn describe_event(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::Subscribed => "Push notifications enabled.".to_string(),
        LifecycleEvent::Unsubscribed => "Push notifications disabled.".to_string(),
        LifecycleEvent::PermissionDenied => {
            "Notification permission was not granted.".to_string()
        }
        LifecycleEvent::SubscribeFailed { error } => {
            format!("Could not enable push notifications: {error}")
        }
        LifecycleEvent::UnsubscribeFailed { error } => {
            format!("Could not disable push notifications: {error}")
        }
        LifecycleEvent::DemoFailed { error } => format!("Demo notification failed: {error}"),
    }
}

/// Explanation for an operation that did not run. `None` when it completed.
#[must_use]
pub const fn describe_outcome(outcome: ToggleOutcome) -> Option<&'static str> {
    match outcome {
        ToggleOutcome::Completed => None,
        ToggleOutcome::Skipped => Some("Nothing to do."),
        ToggleOutcome::Busy => Some("Another push operation is in progress."),
        ToggleOutcome::NotReady => Some("Push notifications are still loading."),
        ToggleOutcome::Unsupported => Some("Push notifications are not supported here."),
        ToggleOutcome::Cancelled => Some("The operation was cancelled."),
    }
}
