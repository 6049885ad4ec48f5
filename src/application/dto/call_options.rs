//! Per-call options for the API client.

use tokio_util::sync::CancellationToken;

use crate::domain::ports::HttpMethod;

/// What the toast side channel does when a call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastPolicy {
    /// Show an error toast.
    #[default]
    Error,
    /// Show a warning toast.
    Warning,
    /// Stay silent; the error is still returned.
    None,
}

/// Options for [`crate::application::ApiClient::call`].
#[derive(Debug, Clone)]
pub struct CallOptions<B = ()> {
    /// Request method.
    pub method: HttpMethod,
    /// Body serialized as JSON.
    pub body: Option<B>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Failure notification policy.
    pub toast: ToastPolicy,
    /// External cancellation signal.
    pub cancel: Option<CancellationToken>,
}

impl CallOptions<()> {
    /// Creates options without a body.
    #[must_use]
    pub const fn new(method: HttpMethod) -> Self {
        Self {
            method,
            body: None,
            headers: Vec::new(),
            toast: ToastPolicy::Error,
            cancel: None,
        }
    }

    /// `GET` without body.
    #[must_use]
    pub const fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    /// `POST` with a JSON body.
    #[must_use]
    pub fn post<B>(body: B) -> CallOptions<B> {
        Self::new(HttpMethod::Post).with_body(body)
    }
}

impl<B> CallOptions<B> {
    /// Replaces the body.
    #[must_use]
    pub fn with_body<T>(self, body: T) -> CallOptions<T> {
        CallOptions {
            method: self.method,
            body: Some(body),
            headers: self.headers,
            toast: self.toast,
            cancel: self.cancel,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the toast policy.
    #[must_use]
    pub const fn toast(mut self, policy: ToastPolicy) -> Self {
        self.toast = policy;
        self
    }

    /// Suppresses toasts.
    #[must_use]
    pub const fn quiet(self) -> Self {
        self.toast(ToastPolicy::None)
    }

    /// Attaches a cancellation signal.
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl Default for CallOptions<()> {
    fn default() -> Self {
        Self::get()
    }
}
