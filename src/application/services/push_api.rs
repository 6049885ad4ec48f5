//! Server-side push subscription routes.

use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use crate::application::dto::{CallOptions, CheckSubscriptionResponse, DemoPushRequest, EndpointRequest};
use crate::application::services::ApiClient;
use crate::domain::entities::PushSubscription;
use crate::domain::errors::ApiError;

/// Push routes. Failures are reported through lifecycle events, so every call is quiet.
#[derive(Clone)]
pub struct PushApi {
    client: ApiClient,
}

impl PushApi {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Records the subscription on the server.
    ///
    /// # Errors
    /// Returns the call's [`ApiError`].
    pub async fn register(
        &self,
        subscription: &PushSubscription,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.client.routes().subscriptions();
        let options = CallOptions::post(subscription).quiet().cancel_on(cancel.clone());
        self.client.call::<_, IgnoredAny>(&url, options).await?;
        Ok(())
    }

    /// Removes the subscription from the server.
    ///
    /// # Errors
    /// Returns the call's [`ApiError`].
    pub async fn unregister(
        &self,
        subscription: &PushSubscription,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.client.routes().unsubscribe();
        let options = CallOptions::post(subscription).quiet().cancel_on(cancel.clone());
        self.client.call::<_, IgnoredAny>(&url, options).await?;
        Ok(())
    }

    /// Asks whether `endpoint` belongs to the signed-in user.
    ///
    /// # Errors
    /// Returns the call's [`ApiError`].
    pub async fn check(&self, endpoint: &str) -> Result<bool, ApiError> {
        let url = self.client.routes().check_subscription();
        let body = EndpointRequest {
            endpoint: Some(endpoint),
        };
        let response: CheckSubscriptionResponse =
            self.client.call(&url, CallOptions::post(body).quiet()).await?;
        Ok(response.is_owner)
    }

    /// Asks the application server to push `request.message` to the subscription.
    ///
    /// # Errors
    /// Returns the call's [`ApiError`].
    pub async fn demo(
        &self,
        request: &DemoPushRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let url = self.client.routes().push_demo();
        let options = CallOptions::post(request).quiet().cancel_on(cancel.clone());
        self.client.call::<_, IgnoredAny>(&url, options).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::application::routes::ApiRoutes;
    use crate::domain::entities::push_subscription::fixtures;
    use crate::domain::ports::MockToastPort;
    use crate::domain::ports::HttpMethod;
    use crate::domain::ports::mocks::{MockReply, MockSession, MockTransport};

    fn api(transport: &Arc<MockTransport>) -> PushApi {
        let mut toast = MockToastPort::new();
        toast.expect_show().never();
        PushApi::new(ApiClient::new(
            transport.clone(),
            Arc::new(MockSession::new()),
            Arc::new(toast),
            ApiRoutes::new("https://api.example", "https://app.example"),
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn test_register_posts_subscription_json() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "/subscriptions", MockReply::ok(&json!(null)));
        let sub = fixtures::subscription("https://push.example/a");

        api(&transport)
            .register(&sub, &CancellationToken::new())
            .await
            .unwrap();

        let sent = transport.requests();
        let body: serde_json::Value = serde_json::from_slice(sent[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(sent[0].url, "https://api.example/subscriptions");
        assert_eq!(body["endpoint"], "https://push.example/a");
        assert_eq!(body["keys"]["auth"], sub.keys().auth);
        assert_eq!(body["keys"]["p256dh"], sub.keys().p256dh);
    }

    #[tokio::test]
    async fn test_unregister_failure_is_returned_without_toast() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "/subscriptions/unsubscribe", MockReply::empty(500));
        let sub = fixtures::subscription("https://push.example/a");

        let err = api(&transport)
            .unregister(&sub, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[tokio::test]
    async fn test_check_reads_is_owner() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            HttpMethod::Post,
            "/subscriptions/check",
            MockReply::ok(&json!({ "isOwner": true })),
        );

        assert!(api(&transport).check("https://push.example/a").await.unwrap());
    }

    #[tokio::test]
    async fn test_demo_targets_app_origin() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "/api/push-demo", MockReply::ok(&json!(null)));
        let sub = fixtures::subscription("https://push.example/a");

        api(&transport)
            .demo(&DemoPushRequest::new(&sub, "hello"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].url, "https://app.example/api/push-demo");
    }
}
