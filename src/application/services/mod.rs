//! Application services.

mod api_client;
mod auth_session;
mod event_channel;
mod permission_watcher;
mod push_api;
mod refresh_coordinator;
mod subscription_manager;

pub use api_client::{ApiClient, DEFAULT_TOAST_KEY};
pub use auth_session::{AuthSession, SessionStatus, SessionStore};
pub use event_channel::EventChannel;
pub use permission_watcher::PermissionWatcher;
pub use push_api::PushApi;
pub use refresh_coordinator::{RefreshCoordinator, RefreshOutcome};
pub use subscription_manager::{SubscriptionManager, SubscriptionSettings, ToggleOutcome};
