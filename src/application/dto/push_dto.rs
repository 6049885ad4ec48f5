//! Push API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::entities::PushSubscription;

/// Body of the demo push route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPushRequest {
    /// Subscription endpoint.
    pub endpoint: String,
    /// Shared auth secret.
    pub auth: String,
    /// Client public key.
    pub p256dh: String,
    /// Message to push.
    pub message: String,
}

impl DemoPushRequest {
    /// Flattens a subscription into the demo body.
    #[must_use]
    pub fn new(subscription: &PushSubscription, message: impl Into<String>) -> Self {
        Self {
            endpoint: subscription.endpoint().to_string(),
            auth: subscription.keys().auth.clone(),
            p256dh: subscription.keys().p256dh.clone(),
            message: message.into(),
        }
    }
}

/// Body carrying only an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointRequest<'a> {
    /// Subscription endpoint, `null` when there is none.
    pub endpoint: Option<&'a str>,
}

/// Ownership check response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CheckSubscriptionResponse {
    /// Whether the endpoint belongs to the signed-in user.
    #[serde(rename = "isOwner")]
    pub is_owner: bool,
}
