//! Notification permission value objects.

use serde::{Deserialize, Serialize};

/// Platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The user has not decided yet.
    #[default]
    Default,
    /// Notifications are allowed.
    Granted,
    /// Notifications are refused.
    Denied,
}

impl Permission {
    /// Returns whether notifications may be shown.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Returns whether the user refused notifications.
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied)
    }

    /// Returns the wire name used by the platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "prompt" => Ok(Self::Default),
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            other => Err(format!("unknown permission state: {other}")),
        }
    }
}

/// An observed change of the notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionTransition {
    /// Permission before the change.
    pub from: Permission,
    /// Permission after the change.
    pub to: Permission,
}

impl PermissionTransition {
    /// Creates a transition, or `None` when nothing changed.
    #[must_use]
    pub fn between(from: Permission, to: Permission) -> Option<Self> {
        (from != to).then_some(Self { from, to })
    }

    /// Returns whether notifications stopped being allowed.
    #[must_use]
    pub const fn is_revocation(&self) -> bool {
        self.from.is_granted() && !self.to.is_granted()
    }
}
