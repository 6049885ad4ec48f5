//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// HTTP transport.
pub mod http;
/// System notifications.
pub mod notifications;
/// Push platform adapters.
pub mod platform;

pub use config::{AppConfig, CliArgs, Command, LogLevel, PermissionAction, StorageManager};
pub use http::ReqwestTransport;
pub use notifications::DesktopNotificationService;
pub use platform::{LocalPushRegistry, PermissionPrompt, StoredPermission};
