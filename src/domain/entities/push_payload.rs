//! Displayable push message payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notification content carried by a push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushPayload {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Icon path or URL.
    pub icon: String,
    /// Badge path or URL.
    pub badge: String,
    /// Page to open when the notification is activated.
    pub url: String,
    /// Replacement tag; notifications with the same tag replace each other.
    pub tag: String,
    /// Free-form application data.
    pub data: Value,
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: "New notification".to_string(),
            body: "No content.".to_string(),
            icon: "/logo/icon-192x192.png".to_string(),
            badge: "/logo/badge-72x72.png".to_string(),
            url: "/".to_string(),
            tag: "default-tag".to_string(),
            data: Value::Object(serde_json::Map::new()),
        }
    }
}

impl PushPayload {
    /// Parses raw push data.
    ///
    /// JSON objects are merged over the defaults; anything else becomes the body.
    /// Returns `None` for an empty message.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        if let Ok(payload) = serde_json::from_slice::<Self>(raw) {
            return Some(payload);
        }

        Some(Self {
            body: String::from_utf8_lossy(raw).trim().to_string(),
            ..Self::default()
        })
    }
}
