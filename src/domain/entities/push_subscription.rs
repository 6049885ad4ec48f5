//! Push subscription descriptor and server key value objects.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::errors::PlatformError;

/// Key material the push service needs to encrypt messages for this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Shared authentication secret (base64url).
    pub auth: String,
    /// Client P-256 ECDH public key (base64url).
    pub p256dh: String,
}

/// Opaque platform subscription descriptor.
///
/// Serializes to the platform JSON form (`{endpoint, expirationTime, keys}`)
/// which is also the body of the registration endpoints. Instances are never
/// mutated; a new subscription replaces the old one wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    endpoint: String,
    #[serde(rename = "expirationTime", default)]
    expiration_time: Option<u64>,
    keys: SubscriptionKeys,
}

impl PushSubscription {
    /// Creates a descriptor, validating that the endpoint is an absolute http(s) URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, keys: SubscriptionKeys) -> Option<Self> {
        let endpoint = endpoint.into();
        let parsed = reqwest::Url::parse(&endpoint).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        if keys.auth.is_empty() || keys.p256dh.is_empty() {
            return None;
        }

        Some(Self {
            endpoint,
            expiration_time: None,
            keys,
        })
    }

    /// Push service endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encryption keys.
    #[must_use]
    pub const fn keys(&self) -> &SubscriptionKeys {
        &self.keys
    }

    /// Expiration as epoch milliseconds, when the push service set one.
    #[must_use]
    pub const fn expiration_time(&self) -> Option<u64> {
        self.expiration_time
    }

    /// Short stable identifier safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        endpoint_fingerprint(&self.endpoint)
    }
}

impl fmt::Debug for PushSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSubscription")
            .field("endpoint", &self.fingerprint())
            .field("expiration_time", &self.expiration_time)
            .finish_non_exhaustive()
    }
}

/// Hashes an endpoint into a 12 character hex identifier.
#[must_use]
pub fn endpoint_fingerprint(endpoint: &str) -> String {
    let digest = Sha256::digest(endpoint.as_bytes());
    hex::encode(&digest[..6])
}

/// Application server (VAPID) public key.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerKey {
    bytes: Vec<u8>,
}

impl ServerKey {
    const UNCOMPRESSED_POINT_LEN: usize = 65;

    /// Decodes a base64url key, padded or not; the standard alphabet is accepted too.
    ///
    /// # Errors
    /// Returns error if the key is not a 65-byte uncompressed P-256 point.
    pub fn from_base64url(value: &str) -> Result<Self, PlatformError> {
        let normalized: String = value
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        if normalized.is_empty() {
            return Err(PlatformError::invalid_server_key("key is empty"));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(normalized.as_bytes())
            .map_err(|e| PlatformError::invalid_server_key(format!("invalid base64url: {e}")))?;

        if bytes.len() != Self::UNCOMPRESSED_POINT_LEN || bytes[0] != 0x04 {
            return Err(PlatformError::invalid_server_key(
                "expected a 65-byte uncompressed P-256 point",
            ));
        }

        Ok(Self { bytes })
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Canonical unpadded base64url form.
    #[must_use]
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.bytes)
    }
}

impl fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServerKey").field(&self.to_base64url()).finish()
    }
}
