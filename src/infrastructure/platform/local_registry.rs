//! Push registry that keeps its subscription in the local state file.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::entities::{PushSubscription, ServerKey, SubscriptionKeys};
use crate::domain::errors::PlatformError;
use crate::domain::ports::PushRegistryPort;
use crate::infrastructure::config::{
    ConfigError, StateConfig, StorageManager, SubscriptionRecord, WorkerRecord,
};

const AUTH_SECRET_LEN: usize = 16;

/// Push registry persisted in `state.toml`.
pub struct LocalPushRegistry {
    storage: Option<StorageManager>,
    push_service_url: String,
}

impl LocalPushRegistry {
    /// Creates a registry. Without storage the platform reports itself unsupported.
    #[must_use]
    pub fn new(storage: Option<StorageManager>, push_service_url: impl Into<String>) -> Self {
        Self {
            storage,
            push_service_url: push_service_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn storage(&self) -> Result<StorageManager, PlatformError> {
        self.storage
            .clone()
            .ok_or_else(|| PlatformError::unsupported("no state directory available"))
    }

    async fn read_state(&self) -> Result<StateConfig, PlatformError> {
        let storage = self.storage()?;
        tokio::task::spawn_blocking(move || storage.load_state().map_err(storage_error))
            .await
            .map_err(|e| PlatformError::storage(e.to_string()))?
    }

    /// Applies `f` to the stored state under the storage lock.
    async fn update_state<R, F>(&self, f: F) -> Result<R, PlatformError>
    where
        R: Send + 'static,
        F: FnOnce(&mut StateConfig) -> Result<R, PlatformError> + Send + 'static,
    {
        let storage = self.storage()?;
        tokio::task::spawn_blocking(move || {
            storage
                .update_state(f)
                .map_err(storage_error)
                .and_then(std::convert::identity)
        })
            .await
            .map_err(|e| PlatformError::storage(e.to_string()))?
    }

    fn mint(&self, server_key: &ServerKey) -> Result<SubscriptionRecord, PlatformError> {
        let mut rng = rand::rng();

        let secret = loop {
            let mut bytes = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut bytes[..]);
            if let Ok(secret) = SecretKey::from_slice(&bytes[..]) {
                break secret;
            }
        };
        let public = secret.public_key().to_encoded_point(false);

        let mut auth = [0u8; AUTH_SECRET_LEN];
        rng.fill_bytes(&mut auth);

        let endpoint = format!("{}/{}", self.push_service_url, Uuid::new_v4());
        let keys = SubscriptionKeys {
            auth: URL_SAFE_NO_PAD.encode(auth),
            p256dh: URL_SAFE_NO_PAD.encode(public.as_bytes()),
        };
        let subscription = PushSubscription::new(endpoint, keys)
            .ok_or_else(|| PlatformError::subscribe("push service URL is not an http(s) URL"))?;

        Ok(SubscriptionRecord {
            subscription,
            server_key: server_key.to_base64url(),
            private_key: URL_SAFE_NO_PAD.encode(secret.to_bytes()),
        })
    }
}

fn storage_error(e: ConfigError) -> PlatformError {
    PlatformError::storage(e.to_string())
}

#[async_trait]
impl PushRegistryPort for LocalPushRegistry {
    fn is_supported(&self) -> bool {
        self.storage.is_some()
    }

    async fn register_service_worker(
        &self,
        script: &str,
        scope: &str,
    ) -> Result<(), PlatformError> {
        if script.trim().is_empty() {
            return Err(PlatformError::worker_registration("script path is empty"));
        }

        let record = WorkerRecord {
            script: script.to_string(),
            scope: scope.to_string(),
        };
        self.update_state(move |state| {
            state.worker = Some(record);
            Ok(())
        })
        .await?;

        debug!(script, scope, "Service worker registered");
        Ok(())
    }

    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PlatformError> {
        let state = self.read_state().await?;
        Ok(state.subscription.map(|r| r.subscription))
    }

    async fn subscribe(&self, server_key: &ServerKey) -> Result<PushSubscription, PlatformError> {
        let record = self.mint(server_key)?;
        let key = server_key.to_base64url();

        let subscription = self
            .update_state(move |state| {
                if state.worker.is_none() {
                    return Err(PlatformError::subscribe("no service worker registered"));
                }
                if let Some(existing) = &state.subscription {
                    if existing.server_key == key {
                        return Ok(existing.subscription.clone());
                    }
                    return Err(PlatformError::subscribe(
                        "a subscription bound to a different server key already exists",
                    ));
                }
                let subscription = record.subscription.clone();
                state.subscription = Some(record);
                Ok(subscription)
            })
            .await?;

        info!(endpoint = %subscription.fingerprint(), "Push subscription created");
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PlatformError> {
        let endpoint = subscription.endpoint().to_string();

        let removed = self
            .update_state(move |state| {
                let matches = state
                    .subscription
                    .as_ref()
                    .is_some_and(|r| r.subscription.endpoint() == endpoint);
                if matches {
                    state.subscription = None;
                }
                Ok(matches)
            })
            .await?;

        if removed {
            info!(endpoint = %subscription.fingerprint(), "Push subscription removed");
        }
        Ok(removed)
    }
}
