use serde::{Deserialize, Serialize};

use crate::domain::entities::{Permission, PushSubscription};

/// Registered service worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub script: String,
    pub scope: String,
}

/// A subscription held by the local registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Descriptor handed to the application server.
    pub subscription: PushSubscription,

    /// Base64url server key the subscription is bound to.
    pub server_key: String,

    /// Base64url P-256 private scalar matching `keys.p256dh`.
    pub private_key: String,
}

/// Persisted platform state.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Notification permission.
    #[serde(default)]
    pub permission: Permission,

    /// Registered service worker.
    #[serde(default)]
    pub worker: Option<WorkerRecord>,

    /// Current push subscription.
    #[serde(default)]
    pub subscription: Option<SubscriptionRecord>,
}
