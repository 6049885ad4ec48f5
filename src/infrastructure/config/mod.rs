//! Application configuration.

pub mod app_config;
pub mod args;
pub mod state_config;
pub mod storage;

pub use app_config::{
    AppConfig, HttpConfig, LogLevel, NotificationsConfig, PushConfig, ServiceWorkerConfig,
};
pub use args::{CliArgs, Command, PermissionAction};
pub use state_config::{StateConfig, SubscriptionRecord, WorkerRecord};
pub use storage::{ConfigError, StorageManager};
