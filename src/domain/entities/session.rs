//! Session credential and user value objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Session cookie handed to the HTTP layer, masked in logs and wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionCookie {
    name: String,
    value: String,
}

impl SessionCookie {
    /// Default cookie name used by the relay server.
    pub const DEFAULT_NAME: &'static str = "session";

    /// Parses `name=value`, or a bare value using the default name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (name, value) = match raw.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (Self::DEFAULT_NAME, raw),
        };

        if name.is_empty() || value.is_empty() || value.contains(';') {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// `Set-Cookie` style header value for seeding a cookie jar.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}={}; Path=/", self.name, self.value)
    }

    /// Returns masked value for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &self.masked())
            .finish()
    }
}

/// Authenticated user as reported by `whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Server-side user identifier.
    pub user_id: String,
    /// Primary email, when shared.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the terms of service were accepted.
    #[serde(default)]
    pub terms_agreed: bool,
}
