//! Toast side-channel port definition.

use std::time::Duration;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
    Message,
}

impl ToastLevel {
    /// How long a toast of this level stays visible.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Info => Duration::from_millis(1500),
            Self::Warning => Duration::from_millis(2500),
            Self::Error => Duration::from_millis(2300),
            Self::Message => Duration::from_millis(3000),
        }
    }
}

/// Port for user-visible, transient notices.
#[cfg_attr(test, mockall::automock)]
pub trait ToastPort: Send + Sync {
    /// Shows a toast. `key` groups toasts that mean the same thing.
    fn show(&self, level: ToastLevel, key: &str, message: &str);
}
