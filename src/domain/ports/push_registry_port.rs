//! Platform push registration port definition.

use async_trait::async_trait;

use crate::domain::entities::{PushSubscription, ServerKey};
use crate::domain::errors::PlatformError;

/// Port for the platform subsystem that owns push subscriptions.
#[async_trait]
pub trait PushRegistryPort: Send + Sync {
    /// Returns whether service workers and push are available at all.
    fn is_supported(&self) -> bool;

    /// Registers the service worker script under the given scope.
    async fn register_service_worker(&self, script: &str, scope: &str)
    -> Result<(), PlatformError>;

    /// Returns the existing subscription without creating one.
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PlatformError>;

    /// Creates a new subscription bound to the application server key.
    async fn subscribe(&self, server_key: &ServerKey) -> Result<PushSubscription, PlatformError>;

    /// Tears down a subscription. Returns `false` when it was already gone.
    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PlatformError>;
}
