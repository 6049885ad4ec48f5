//! Notification permission port definition.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::entities::Permission;
use crate::domain::errors::PlatformError;

/// Port for the platform notification permission.
#[async_trait]
pub trait PermissionPort: Send + Sync {
    /// Returns whether the platform can show notifications at all.
    fn is_supported(&self) -> bool;

    /// Current permission.
    fn current(&self) -> Permission;

    /// Asks the user for permission; resolves immediately if already decided.
    async fn request(&self) -> Result<Permission, PlatformError>;

    /// Receiver that observes every permission change, including out-of-band ones.
    fn watch(&self) -> watch::Receiver<Permission>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    /// Permission port driven by the test.
    pub struct MockPermission {
        supported: AtomicBool,
        tx: watch::Sender<Permission>,
        answer: Mutex<Permission>,
        requests: AtomicUsize,
    }

    impl MockPermission {
        /// Starts at `initial`; a prompt answers with `answer`.
        pub fn new(initial: Permission, answer: Permission) -> Self {
            let (tx, _rx) = watch::channel(initial);
            Self {
                supported: AtomicBool::new(true),
                tx,
                answer: Mutex::new(answer),
                requests: AtomicUsize::new(0),
            }
        }

        pub fn granted() -> Self {
            Self::new(Permission::Granted, Permission::Granted)
        }

        pub fn unsupported() -> Self {
            let port = Self::granted();
            port.supported.store(false, Ordering::SeqCst);
            port
        }

        /// Simulates an out-of-band change from the platform settings.
        pub fn set(&self, permission: Permission) {
            self.tx.send_replace(permission);
        }

        pub fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PermissionPort for MockPermission {
        fn is_supported(&self) -> bool {
            self.supported.load(Ordering::SeqCst)
        }

        fn current(&self) -> Permission {
            *self.tx.borrow()
        }

        async fn request(&self) -> Result<Permission, PlatformError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let current = self.current();
            if current != Permission::Default {
                return Ok(current);
            }
            let answer = *self.answer.lock();
            self.tx.send_replace(answer);
            Ok(answer)
        }

        fn watch(&self) -> watch::Receiver<Permission> {
            self.tx.subscribe()
        }
    }
}
