//! Signed-in user session.

use std::sync::Arc;

use serde::de::IgnoredAny;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::dto::{CallOptions, EndpointRequest};
use crate::application::services::ApiClient;
use crate::domain::entities::UserInfo;
use crate::domain::errors::ApiError;
use crate::domain::ports::{HttpMethod, SessionPort};

/// What is known about the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// `init()` has not settled yet.
    #[default]
    Unknown,
    /// No valid session.
    Anonymous,
    /// Signed in.
    Authenticated(UserInfo),
}

impl SessionStatus {
    #[must_use]
    pub const fn user(&self) -> Option<&UserInfo> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Holder of the session status; the target of forced logouts.
///
/// Created before the API client so the refresh path can clear it without a cycle.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionStatus>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Unknown);
        Self { tx }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.tx.borrow().clone()
    }

    pub fn set(&self, status: SessionStatus) {
        self.tx.send_replace(status);
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }
}

impl SessionPort for SessionStore {
    fn force_logout(&self) {
        info!("Session could not be refreshed, signing out");
        self.set(SessionStatus::Anonymous);
    }
}

/// Session operations backed by the server.
#[derive(Clone)]
pub struct AuthSession {
    client: ApiClient,
    store: Arc<SessionStore>,
}

impl AuthSession {
    #[must_use]
    pub const fn new(client: ApiClient, store: Arc<SessionStore>) -> Self {
        Self { client, store }
    }

    /// Asks the server who is signed in. Never fails; an error means anonymous.
    pub async fn init(&self) -> SessionStatus {
        let url = self.client.routes().whoami();
        let status = match self
            .client
            .call::<(), Option<UserInfo>>(&url, CallOptions::get().quiet())
            .await
        {
            Ok(Some(user)) => {
                debug!(user_id = %user.user_id, "Session restored");
                SessionStatus::Authenticated(user)
            }
            Ok(None) => SessionStatus::Anonymous,
            Err(e) => {
                debug!(error = %e, "No active session");
                SessionStatus::Anonymous
            }
        };

        self.store.set(status.clone());
        status
    }

    /// Signs out on the server, telling it which push endpoint to drop.
    /// Local state is cleared even when the call fails.
    ///
    /// # Errors
    /// Returns the logout call's [`ApiError`].
    pub async fn logout(&self, endpoint: Option<&str>) -> Result<(), ApiError> {
        let url = self.client.routes().logout();
        let result = self
            .client
            .call::<_, IgnoredAny>(&url, CallOptions::post(EndpointRequest { endpoint }))
            .await;

        if let Err(e) = &result {
            warn!(error = %e, "Server logout failed");
        }
        self.store.set(SessionStatus::Anonymous);
        info!("Signed out");

        result.map(|_| ())
    }

    /// Records that the signed-in user accepted the terms.
    ///
    /// # Errors
    /// Returns [`ApiError`] if the server rejects the call.
    pub async fn agree_to_terms(&self) -> Result<(), ApiError> {
        let url = self.client.routes().terms_agree();
        self.client
            .call::<(), IgnoredAny>(&url, CallOptions::new(HttpMethod::Post))
            .await?;

        if let SessionStatus::Authenticated(mut user) = self.store.status() {
            user.terms_agreed = true;
            self.store.set(SessionStatus::Authenticated(user));
        }
        Ok(())
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.store.status()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.status(), SessionStatus::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<UserInfo> {
        self.store.status().user().cloned()
    }

    #[must_use]
    pub fn has_agreed_to_terms(&self) -> bool {
        self.user().is_some_and(|u| u.terms_agreed)
    }

    /// Resolves once `init()` has settled.
    pub async fn when_ready(&self) -> SessionStatus {
        let mut rx = self.store.subscribe();
        match rx.wait_for(|s| *s != SessionStatus::Unknown).await {
            Ok(status) => status.clone(),
            Err(_) => self.store.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::application::routes::ApiRoutes;
    use crate::domain::ports::mocks::{MockReply, MockTransport};
    use crate::domain::ports::MockToastPort;

    fn session(transport: &Arc<MockTransport>) -> (AuthSession, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        let mut toast = MockToastPort::new();
        toast.expect_show().returning(|_, _, _| ());
        let client = ApiClient::new(
            transport.clone(),
            store.clone(),
            Arc::new(toast),
            ApiRoutes::new("https://api.example", "https://api.example"),
            Duration::from_secs(5),
        );
        (AuthSession::new(client, store.clone()), store)
    }

    #[tokio::test]
    async fn test_init_with_user() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            HttpMethod::Get,
            "/users/whoami",
            MockReply::ok(&json!({ "user_id": "u1", "email": "a@b.c", "terms_agreed": true })),
        );
        let (auth, _) = session(&transport);

        auth.init().await;

        assert!(auth.is_authenticated());
        assert!(auth.has_agreed_to_terms());
        assert_eq!(auth.user().unwrap().email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn test_init_failure_is_anonymous() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Get, "/users/whoami", MockReply::Fail("offline".to_string()));
        let (auth, _) = session(&transport);

        assert_eq!(auth.init().await, SessionStatus::Anonymous);
        assert!(!auth.is_authenticated());
        assert!(!auth.has_agreed_to_terms());
    }

    #[tokio::test]
    async fn test_when_ready_waits_for_init() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Get, "/users/whoami", MockReply::ok(&json!({ "user_id": "u1" })));
        let (auth, _) = session(&transport);

        let waiter = tokio::spawn({
            let auth = auth.clone();
            async move { auth.when_ready().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        auth.init().await;
        assert!(matches!(waiter.await.unwrap(), SessionStatus::Authenticated(_)));
    }

    #[tokio::test]
    async fn test_logout_sends_endpoint_and_clears() {
        let transport = Arc::new(MockTransport::new());
        transport
            .on(HttpMethod::Get, "/users/whoami", MockReply::ok(&json!({ "user_id": "u1" })))
            .on(HttpMethod::Post, "/auth/logout", MockReply::empty(204));
        let (auth, _) = session(&transport);
        auth.init().await;

        auth.logout(Some("https://push.example/a")).await.unwrap();

        assert!(!auth.is_authenticated());
        let sent = transport.requests();
        let body: serde_json::Value = serde_json::from_slice(sent[1].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({ "endpoint": "https://push.example/a" }));
    }

    #[tokio::test]
    async fn test_logout_failure_still_clears() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "/auth/logout", MockReply::empty(500));
        let (auth, store) = session(&transport);
        store.set(SessionStatus::Authenticated(UserInfo {
            user_id: "u1".to_string(),
            email: None,
            terms_agreed: false,
        }));

        assert!(auth.logout(None).await.is_err());
        assert_eq!(auth.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_agree_to_terms_updates_user() {
        let transport = Arc::new(MockTransport::new());
        transport
            .on(HttpMethod::Get, "/users/whoami", MockReply::ok(&json!({ "user_id": "u1" })))
            .on(HttpMethod::Post, "/users/terms-agree", MockReply::empty(204));
        let (auth, _) = session(&transport);
        auth.init().await;
        assert!(!auth.has_agreed_to_terms());

        auth.agree_to_terms().await.unwrap();

        assert!(auth.has_agreed_to_terms());
        assert_eq!(transport.count(HttpMethod::Post, "/users/terms-agree"), 1);
    }

    #[test]
    fn test_force_logout_clears_store() {
        let store = SessionStore::new();
        store.set(SessionStatus::Authenticated(UserInfo {
            user_id: "u1".to_string(),
            email: None,
            terms_agreed: true,
        }));

        store.force_logout();
        assert_eq!(store.status(), SessionStatus::Anonymous);
    }
}
