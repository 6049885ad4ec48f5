//! Platform push-registration error types.

use thiserror::Error;

/// Push platform error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum PlatformError {
    #[error("push notifications are not supported: {reason}")]
    Unsupported { reason: String },

    #[error("service worker registration failed: {message}")]
    WorkerRegistration { message: String },

    #[error("push subscription failed: {message}")]
    Subscribe { message: String },

    #[error("push unsubscription failed: {message}")]
    Unsubscribe { message: String },

    #[error("notification permission query failed: {message}")]
    Permission { message: String },

    #[error("platform storage error: {message}")]
    Storage { message: String },

    #[error("invalid application server key: {reason}")]
    InvalidServerKey { reason: String },
}

impl PlatformError {
    /// Creates unsupported error.
    #[must_use]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Creates worker registration error.
    #[must_use]
    pub fn worker_registration(message: impl Into<String>) -> Self {
        Self::WorkerRegistration {
            message: message.into(),
        }
    }

    /// Creates subscribe error.
    #[must_use]
    pub fn subscribe(message: impl Into<String>) -> Self {
        Self::Subscribe {
            message: message.into(),
        }
    }

    /// Creates unsubscribe error.
    #[must_use]
    pub fn unsubscribe(message: impl Into<String>) -> Self {
        Self::Unsubscribe {
            message: message.into(),
        }
    }

    /// Creates permission error.
    #[must_use]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Creates storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates invalid server key error.
    #[must_use]
    pub fn invalid_server_key(reason: impl Into<String>) -> Self {
        Self::InvalidServerKey {
            reason: reason.into(),
        }
    }

    /// Returns whether the platform can never satisfy the request.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
