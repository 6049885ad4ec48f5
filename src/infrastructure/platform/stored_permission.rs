//! Notification permission persisted in the local state file.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::domain::entities::Permission;
use crate::domain::errors::PlatformError;
use crate::domain::ports::PermissionPort;
use crate::infrastructure::config::StorageManager;

/// Asks the user for a decision. Resolves to `Default` when they dismiss the prompt.
pub type PermissionPrompt = Arc<dyn Fn() -> BoxFuture<'static, Permission> + Send + Sync>;

/// Permission port backed by `state.toml`.
pub struct StoredPermission {
    storage: Option<StorageManager>,
    tx: watch::Sender<Permission>,
    prompt: PermissionPrompt,
    prompting: Mutex<()>,
}

impl StoredPermission {
    /// Loads the stored permission. Without storage the platform reports itself unsupported.
    #[must_use]
    pub fn load(storage: Option<StorageManager>, prompt: PermissionPrompt) -> Self {
        let initial = storage
            .as_ref()
            .and_then(|s| match s.load_state() {
                Ok(state) => Some(state.permission),
                Err(e) => {
                    warn!(error = %e, "Failed to read stored permission");
                    None
                }
            })
            .unwrap_or_default();

        let (tx, _rx) = watch::channel(initial);
        Self {
            storage,
            tx,
            prompt,
            prompting: Mutex::new(()),
        }
    }

    /// Changes the permission from outside the prompt, persisting and publishing it.
    ///
    /// # Errors
    /// Returns error if the state cannot be written.
    pub fn set(&self, permission: Permission) -> Result<(), PlatformError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PlatformError::unsupported("no state directory available"))?;

        storage
            .update_state(|state| state.permission = permission)
            .map_err(|e| PlatformError::storage(e.to_string()))?;

        let previous = self.tx.send_replace(permission);
        if previous != permission {
            info!(from = %previous, to = %permission, "Notification permission changed");
        }
        Ok(())
    }

    /// Re-reads the stored value and publishes it if another process changed it.
    ///
    /// # Errors
    /// Returns error if the state cannot be read.
    pub fn reload(&self) -> Result<Permission, PlatformError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PlatformError::unsupported("no state directory available"))?;

        let stored = storage
            .load_state()
            .map_err(|e| PlatformError::storage(e.to_string()))?
            .permission;

        let changed = self.tx.send_if_modified(|current| {
            if *current == stored {
                return false;
            }
            *current = stored;
            true
        });
        if changed {
            info!(to = %stored, "Notification permission changed outside this process");
        }
        Ok(stored)
    }
}

#[async_trait]
impl PermissionPort for StoredPermission {
    fn is_supported(&self) -> bool {
        self.storage.is_some()
    }

    fn current(&self) -> Permission {
        *self.tx.borrow()
    }

    async fn request(&self) -> Result<Permission, PlatformError> {
        if !self.is_supported() {
            return Err(PlatformError::unsupported("notifications are not available"));
        }

        let _prompting = self.prompting.lock().await;
        let current = self.current();
        if current != Permission::Default {
            return Ok(current);
        }

        let answer = (self.prompt)().await;
        if answer != Permission::Default {
            self.set(answer)?;
        }
        Ok(answer)
    }

    fn watch(&self) -> watch::Receiver<Permission> {
        self.tx.subscribe()
    }
}
