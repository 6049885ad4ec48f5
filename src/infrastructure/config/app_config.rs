//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::{ClientSettings, SubscriptionSettings};

const APP_NAME: &str = "pushwire";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by CLI/env.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Session cookie; never written to disk.
    #[serde(skip)]
    pub session: Option<String>,

    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Origin serving the demo push route. Defaults to `api_url`.
    #[serde(default)]
    pub app_url: Option<String>,

    /// Application server public key (base64url).
    #[serde(default)]
    pub vapid_key: String,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Service worker registration.
    #[serde(default)]
    pub service_worker: ServiceWorkerConfig,

    /// Push subscription behavior.
    #[serde(default)]
    pub push: PushConfig,

    /// HTTP client behavior.
    #[serde(default)]
    pub http: HttpConfig,

    /// Notification configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Service worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWorkerConfig {
    /// Script path.
    #[serde(default = "default_worker_script")]
    pub script: String,

    /// Registration scope.
    #[serde(default = "default_worker_scope")]
    pub scope: String,
}

impl Default for ServiceWorkerConfig {
    fn default() -> Self {
        Self {
            script: default_worker_script(),
            scope: default_worker_scope(),
        }
    }
}

/// Push configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
    /// Seconds before a demo-only subscription is removed.
    #[serde(default = "default_demo_teardown_secs")]
    pub demo_teardown_secs: u64,

    /// Lifecycle events kept before the oldest is dropped.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Base URL under which the local registry mints endpoints.
    #[serde(default = "default_push_service_url")]
    pub push_service_url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            demo_teardown_secs: default_demo_teardown_secs(),
            event_capacity: default_event_capacity(),
            push_service_url: default_push_service_url(),
        }
    }
}

/// HTTP configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound for a session refresh in seconds.
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Enable desktop notifications for delivered pushes.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window in which a repeated toast is suppressed.
    #[serde(default = "default_toast_cooldown_ms")]
    pub toast_cooldown_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            toast_cooldown_ms: default_toast_cooldown_ms(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_worker_script() -> String {
    "/service-worker.js".to_string()
}

fn default_worker_scope() -> String {
    "/".to_string()
}

const fn default_demo_teardown_secs() -> u64 {
    60
}

const fn default_event_capacity() -> usize {
    64
}

fn default_push_service_url() -> String {
    "https://push.localhost/send".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_refresh_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("{}/{}", crate::NAME, crate::VERSION)
}

const fn default_true() -> bool {
    true
}

const fn default_toast_cooldown_ms() -> u64 {
    1400
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration. Runtime values win.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(api_url) = &args.api_url {
            self.api_url.clone_from(api_url);
        }
        if let Some(app_url) = &args.app_url {
            self.app_url = Some(app_url.clone());
        }
        if let Some(vapid_key) = &args.vapid_key {
            self.vapid_key.clone_from(vapid_key);
        }
        if let Some(session) = &args.session {
            self.session = Some(session.clone());
        }
        if let Some(notifications) = args.desktop_notifications {
            self.notifications.enabled = notifications;
        }
    }

    /// Origin serving the demo route.
    #[must_use]
    pub fn effective_app_url(&self) -> &str {
        self.app_url.as_deref().unwrap_or(&self.api_url)
    }

    /// Settings for the client context.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_url: self.api_url.clone(),
            app_url: self.effective_app_url().to_string(),
            refresh_timeout: Duration::from_secs(self.http.refresh_timeout_secs),
            event_capacity: self.push.event_capacity,
            subscription: SubscriptionSettings {
                server_key: self.vapid_key.clone(),
                worker_script: self.service_worker.script.clone(),
                worker_scope: self.service_worker.scope.clone(),
                demo_teardown: Duration::from_secs(self.push.demo_teardown_secs),
            },
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("pushwire.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            session: None,
            api_url: default_api_url(),
            app_url: None,
            vapid_key: String::new(),
            log_level: LogLevel::Info,
            service_worker: ServiceWorkerConfig::default(),
            push: PushConfig::default(),
            http: HttpConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}
