//! Presentation layer with the command runner and terminal output.

/// Command runner.
pub mod cli;
/// User-facing text.
pub mod messages;
/// Terminal toasts.
pub mod toast;

pub use cli::{Cli, terminal_prompt};
pub use toast::TerminalToast;
