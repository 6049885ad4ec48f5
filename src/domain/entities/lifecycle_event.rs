//! Push lifecycle events consumed by the UI.

/// Outcome of a subscription lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LifecycleEvent {
    Subscribed,
    Unsubscribed,
    PermissionDenied,
    SubscribeFailed { error: String },
    UnsubscribeFailed { error: String },
    DemoFailed { error: String },
}

impl LifecycleEvent {
    #[must_use]
    pub fn subscribe_failed(error: impl Into<String>) -> Self {
        Self::SubscribeFailed {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn unsubscribe_failed(error: impl Into<String>) -> Self {
        Self::UnsubscribeFailed {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn demo_failed(error: impl Into<String>) -> Self {
        Self::DemoFailed {
            error: error.into(),
        }
    }

    /// Wire name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::PermissionDenied => "permission-denied",
            Self::SubscribeFailed { .. } => "subscribe-failed",
            Self::UnsubscribeFailed { .. } => "unsubscribe-failed",
            Self::DemoFailed { .. } => "demo-failed",
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::SubscribeFailed { .. }
                | Self::UnsubscribeFailed { .. }
                | Self::DemoFailed { .. }
        )
    }

    /// Error detail carried by failure events.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::SubscribeFailed { error }
            | Self::UnsubscribeFailed { error }
            | Self::DemoFailed { error } => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error() {
            Some(error) => write!(f, "{}: {error}", self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}
