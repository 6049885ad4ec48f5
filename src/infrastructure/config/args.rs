use super::app_config::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pushwire",
    version,
    about = "Web push subscription client",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// API base URL.
    #[arg(long, env = "PUSHWIRE_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Origin serving the demo push route.
    #[arg(long, env = "PUSHWIRE_APP_URL", value_name = "URL")]
    pub app_url: Option<String>,

    /// Application server public key (base64url).
    #[arg(long, env = "PUSHWIRE_VAPID_KEY", value_name = "KEY")]
    pub vapid_key: Option<String>,

    /// Session cookie, as `name=value`.
    #[arg(long, env = "PUSHWIRE_SESSION", value_name = "COOKIE", hide_env_values = true)]
    pub session: Option<String>,

    /// Enable desktop notifications.
    #[arg(long)]
    pub desktop_notifications: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show session, permission and subscription state.
    Status,
    /// Subscribe to push notifications.
    Subscribe,
    /// Remove the push subscription.
    Unsubscribe,
    /// Ask the server to send a demo notification.
    Demo {
        /// Notification message.
        message: String,
    },
    /// Change the notification permission.
    Permission {
        #[arg(value_enum)]
        action: PermissionAction,
    },
    /// Show the signed-in user.
    Whoami,
    /// Accept the terms of service.
    AgreeTerms,
    /// Sign out.
    Logout,
    /// Ask the server whether it holds this client's subscription.
    Check,
    /// Display a push payload as the worker would.
    Deliver {
        /// Raw payload; JSON or plain text.
        payload: String,
    },
    /// Follow permission changes and lifecycle events until interrupted.
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionAction {
    Grant,
    Deny,
    Reset,
}
