//! Typed API client with transparent session refresh.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::dto::{ApiEnvelope, CallOptions, ToastPolicy, parse_error_body};
use crate::application::routes::ApiRoutes;
use crate::application::services::refresh_coordinator::{RefreshCoordinator, RefreshOutcome};
use crate::domain::errors::ApiError;
use crate::domain::ports::{HttpRequest, HttpResponse, HttpTransport, SessionPort, ToastLevel, ToastPort};

/// Toast key used when an error carries no code.
pub const DEFAULT_TOAST_KEY: &str = "DEFAULT";

/// Single entry point for every server call.
///
/// A 401 from any route other than the refresh route parks the call on the
/// shared [`RefreshCoordinator`] and replays it once on success. A second
/// 401 after the replay is terminal.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    refresh: Arc<RefreshCoordinator>,
    toast: Arc<dyn ToastPort>,
    routes: ApiRoutes,
}

impl ApiClient {
    /// Creates new client.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<dyn SessionPort>,
        toast: Arc<dyn ToastPort>,
        routes: ApiRoutes,
        refresh_timeout: Duration,
    ) -> Self {
        let refresh = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            session,
            routes.refresh(),
            refresh_timeout,
        ));

        Self {
            transport,
            refresh,
            toast,
            routes,
        }
    }

    #[must_use]
    pub const fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    /// Shared refresh coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    /// Performs a call and decodes the envelope payload into `Res`.
    ///
    /// Use `serde::de::IgnoredAny` when the payload does not matter and
    /// `Option<T>` when the route may answer 204.
    ///
    /// # Errors
    /// Every failure is an [`ApiError`]; the toast side channel fires first
    /// unless the policy is [`ToastPolicy::None`] or the call was cancelled.
    pub async fn call<Req, Res>(&self, url: &str, options: CallOptions<Req>) -> Result<Res, ApiError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let CallOptions {
            method,
            body,
            headers,
            toast,
            cancel,
        } = options;

        let result = match Self::encode(body.as_ref()) {
            Ok(body) => {
                let mut request = HttpRequest::new(method, url).with_headers(headers);
                request.body = body;

                match cancel {
                    Some(token) => tokio::select! {
                        biased;
                        () = token.cancelled() => Err(ApiError::cancelled()),
                        result = self.execute(request) => result,
                    },
                    None => self.execute(request).await,
                }
            }
            Err(e) => Err(e),
        };

        if let Err(error) = &result {
            debug!(%method, url, status = error.status, code = ?error.code, "API call failed");
            self.notify(toast, error);
        }

        result
    }

    fn encode<Req: Serialize>(body: Option<&Req>) -> Result<Option<Bytes>, ApiError> {
        body.map(|b| {
            serde_json::to_vec(b)
                .map(Bytes::from)
                .map_err(|e| ApiError::network(format!("invalid request body: {e}")))
        })
        .transpose()
    }

    async fn execute<Res: DeserializeOwned>(&self, request: HttpRequest) -> Result<Res, ApiError> {
        let refreshable = !self.routes.is_refresh(&request.url);
        let mut replayed = false;

        loop {
            let response = self.transport.send(request.clone()).await?;

            if response.status == 401 && refreshable {
                if replayed {
                    warn!(url = %request.url, "Still unauthorized after refresh");
                    return Err(ApiError::session_expired());
                }

                match self.refresh.refresh().await {
                    RefreshOutcome::Refreshed => {
                        debug!(url = %request.url, "Replaying call after refresh");
                        replayed = true;
                        continue;
                    }
                    RefreshOutcome::Failed => return Err(ApiError::session_expired()),
                }
            }

            return Self::decode(response);
        }
    }

    fn decode<Res: DeserializeOwned>(response: HttpResponse) -> Result<Res, ApiError> {
        if !response.is_success() {
            let detail = parse_error_body(&response.body);
            let message = detail
                .message
                .or_else(|| (!response.status_text.is_empty()).then(|| response.status_text.clone()))
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            return Err(ApiError::http(response.status, detail.code, message));
        }

        if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(Value::Null)
                .map_err(|e| ApiError::network(format!("unexpected empty response: {e}")));
        }

        let envelope: ApiEnvelope = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::network(format!("invalid response body: {e}")))?;

        if !envelope.success {
            return Err(envelope.into_error(response.status));
        }

        serde_json::from_value(envelope.data.unwrap_or(Value::Null))
            .map_err(|e| ApiError::network(format!("unexpected response payload: {e}")))
    }

    fn notify(&self, policy: ToastPolicy, error: &ApiError) {
        if error.is_cancelled() {
            return;
        }

        let level = match policy {
            ToastPolicy::Error => ToastLevel::Error,
            ToastPolicy::Warning => ToastLevel::Warning,
            ToastPolicy::None => return,
        };

        self.toast
            .show(level, error.code().unwrap_or(DEFAULT_TOAST_KEY), &error.message);
    }
}
