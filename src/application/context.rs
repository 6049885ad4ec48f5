//! Composition root for one client process.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::application::routes::ApiRoutes;
use crate::application::services::{
    ApiClient, AuthSession, EventChannel, PushApi, SessionStatus, SessionStore,
    SubscriptionManager, SubscriptionSettings,
};
use crate::application::use_cases::DeliverPushUseCase;
use crate::domain::errors::ApiError;
use crate::domain::ports::{
    HttpTransport, NotificationPort, PermissionPort, PushRegistryPort, ToastPort,
};

/// Settings the context is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// API base URL.
    pub api_url: String,
    /// Application origin serving the demo route.
    pub app_url: String,
    /// Upper bound for a session refresh.
    pub refresh_timeout: Duration,
    /// Lifecycle events kept before the oldest is dropped.
    pub event_capacity: usize,
    /// Subscription manager inputs.
    pub subscription: SubscriptionSettings,
}

/// Adapters the context wires together.
#[allow(missing_docs)]
pub struct ClientPorts {
    pub transport: Arc<dyn HttpTransport>,
    pub registry: Arc<dyn PushRegistryPort>,
    pub permission: Arc<dyn PermissionPort>,
    pub toast: Arc<dyn ToastPort>,
    pub notifier: Arc<dyn NotificationPort>,
}

/// Owns every stateful component; there is no hidden global state.
pub struct ClientContext {
    client: ApiClient,
    session: AuthSession,
    push_api: PushApi,
    manager: SubscriptionManager,
    events: Arc<EventChannel>,
    deliver: DeliverPushUseCase,
}

impl ClientContext {
    /// Wires the context. Nothing runs until [`Self::initialize`].
    #[must_use]
    pub fn new(settings: ClientSettings, ports: ClientPorts) -> Self {
        let store = Arc::new(SessionStore::new());
        let client = ApiClient::new(
            ports.transport,
            store.clone(),
            ports.toast,
            ApiRoutes::new(&settings.api_url, &settings.app_url),
            settings.refresh_timeout,
        );

        let events = Arc::new(EventChannel::new(settings.event_capacity));
        let push_api = PushApi::new(client.clone());
        let manager = SubscriptionManager::new(
            ports.registry,
            ports.permission,
            push_api.clone(),
            events.clone(),
            settings.subscription,
        );

        debug!(api_url = %settings.api_url, "Client context created");

        Self {
            session: AuthSession::new(client.clone(), store),
            client,
            push_api,
            manager,
            events,
            deliver: DeliverPushUseCase::new(ports.notifier),
        }
    }

    /// Resolves the session and brings up the subscription manager.
    pub async fn initialize(&self) -> SessionStatus {
        let (status, ()) = tokio::join!(self.session.init(), self.manager.initialize());
        info!(
            authenticated = matches!(status, SessionStatus::Authenticated(_)),
            phase = %self.manager.phase(),
            "Client initialized"
        );
        status
    }

    /// Stops background work.
    pub async fn dispose(&self) {
        self.manager.dispose().await;
        debug!("Client context disposed");
    }

    /// Signs out, passing the current push endpoint to the server.
    ///
    /// # Errors
    /// Returns the logout call's [`ApiError`]; the local session is cleared anyway.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let endpoint = self.manager.endpoint();
        self.session.logout(endpoint.as_deref()).await
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub const fn push_api(&self) -> &PushApi {
        &self.push_api
    }

    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionManager {
        &self.manager
    }

    #[must_use]
    pub const fn events(&self) -> &Arc<EventChannel> {
        &self.events
    }

    #[must_use]
    pub const fn deliver(&self) -> &DeliverPushUseCase {
        &self.deliver
    }
}
