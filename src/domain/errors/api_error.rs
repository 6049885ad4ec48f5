//! API call error type.

use thiserror::Error;

/// Classification of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Transport or connectivity failure, including unreadable responses.
    Network,
    /// Non-2xx HTTP status.
    Http,
    /// 2xx envelope with `success: false`.
    Business,
    /// 401 that survived a refresh attempt, or a failed refresh.
    SessionExpired,
    /// The caller cancelled the call.
    Cancelled,
}

/// Structured error surfaced by every API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{status}] {message}")]
pub struct ApiError {
    /// HTTP status, or 0 when no response was obtained.
    pub status: u16,
    /// Human-readable detail.
    pub message: String,
    /// Machine-readable code.
    pub code: Option<String>,
    /// Error classification.
    pub kind: ApiErrorKind,
}

impl ApiError {
    /// Code for transport failures.
    pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
    /// Code for sessions that could not be refreshed.
    pub const SESSION_EXPIRED: &'static str = "SESSION_EXPIRED";
    /// Code for cancelled calls.
    pub const CANCELLED: &'static str = "CANCELLED";

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: message.into(),
            code: Some(Self::NETWORK_ERROR.to_string()),
            kind: ApiErrorKind::Network,
        }
    }

    /// Creates session expired error.
    #[must_use]
    pub fn session_expired() -> Self {
        Self {
            status: 401,
            message: "session expired".to_string(),
            code: Some(Self::SESSION_EXPIRED.to_string()),
            kind: ApiErrorKind::SessionExpired,
        }
    }

    /// Creates cancellation error.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            status: 0,
            message: "request cancelled".to_string(),
            code: Some(Self::CANCELLED.to_string()),
            kind: ApiErrorKind::Cancelled,
        }
    }

    /// Creates HTTP error, inferring a code from the status when none was sent.
    #[must_use]
    pub fn http(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.or_else(|| Some(Self::infer_code(status).to_string())),
            kind: ApiErrorKind::Http,
        }
    }

    /// Creates business error from a `success: false` envelope.
    #[must_use]
    pub fn business(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            kind: ApiErrorKind::Business,
        }
    }

    /// Maps an HTTP status to a code for bodies that carry none.
    #[must_use]
    pub const fn infer_code(status: u16) -> &'static str {
        match status {
            400 | 422 => "INVALID_PARAMETER",
            401 => "AUTH_REQUIRED",
            403 => "FORBIDDEN",
            404 => "NOT_FOUND",
            500..=599 => "SERVER_ERROR",
            _ => "HTTP_ERROR",
        }
    }

    /// Machine-readable code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns whether no response was obtained.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Network)
    }

    /// Returns whether the session could not be recovered.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self.kind, ApiErrorKind::SessionExpired)
    }

    /// Returns whether the call was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Cancelled)
    }

    /// Returns whether the status is 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}
