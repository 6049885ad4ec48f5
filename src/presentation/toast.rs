//! Toasts printed to the terminal.

use std::collections::HashMap;
use std::io::Write;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::application::DEFAULT_TOAST_KEY;
use crate::domain::ports::{ToastLevel, ToastPort};
use crate::presentation::messages::error_message;

/// A rendered toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub duration: Duration,
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.level {
            ToastLevel::Info => "info",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
            ToastLevel::Message => "message",
        };
        write!(f, "[{label}] {}", self.message)
    }
}

/// Toast port writing to a terminal stream. Repeats of one key within the cooldown are dropped.
pub struct TerminalToast {
    cooldown: Duration,
    last_shown: Mutex<HashMap<String, Instant>>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalToast {
    /// Toasts on stderr.
    #[must_use]
    pub fn stderr(cooldown: Duration) -> Self {
        Self::with_writer(cooldown, Box::new(std::io::stderr()))
    }

    #[must_use]
    pub fn with_writer(cooldown: Duration, out: Box<dyn Write + Send>) -> Self {
        Self {
            cooldown,
            last_shown: Mutex::new(HashMap::new()),
            out: Mutex::new(out),
        }
    }

    /// Records `key` and returns whether a toast for it may be shown now.
    pub fn should_show(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut last_shown = self.last_shown.lock();

        if last_shown
            .get(key)
            .is_some_and(|last| now.duration_since(*last) < self.cooldown)
        {
            return false;
        }

        last_shown.insert(key.to_string(), now);
        true
    }

    /// Builds the toast for a key: the catalog text for error codes, the message otherwise.
    #[must_use]
    pub fn compose(level: ToastLevel, key: &str, message: &str) -> Toast {
        let message = match level {
            ToastLevel::Error | ToastLevel::Warning => {
                let code = (key != DEFAULT_TOAST_KEY).then_some(key);
                error_message(code, Some(message)).to_string()
            }
            ToastLevel::Info | ToastLevel::Message => message.to_string(),
        };

        Toast {
            level,
            message,
            duration: level.duration(),
        }
    }
}

impl ToastPort for TerminalToast {
    fn show(&self, level: ToastLevel, key: &str, message: &str) {
        if !self.should_show(key) {
            debug!(key, "Toast suppressed by cooldown");
            return;
        }

        let toast = Self::compose(level, key, message);
        debug!(key, duration_ms = toast.duration.as_millis(), "Showing toast");

        let mut out = self.out.lock();
        let _ = writeln!(out, "{toast}");
    }
}
