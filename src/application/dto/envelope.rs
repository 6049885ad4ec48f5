//! Response envelope decoding.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::errors::ApiError;

/// Success envelope wrapping every 2xx payload.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    /// Application status code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Business-level success flag; a missing flag counts as failure.
    #[serde(default)]
    pub success: bool,
    /// Payload.
    #[serde(default)]
    pub data: Option<Value>,
    /// Optional detail.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Converts a `success: false` envelope into a business error.
    #[must_use]
    pub fn into_error(self, http_status: u16) -> ApiError {
        let status = self
            .code
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(http_status);

        ApiError::business(
            status,
            self.code.map(|c| c.to_string()),
            self.message.unwrap_or_else(|| "API Error".to_string()),
        )
    }
}

/// Code and message extracted from an error body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
}

/// Reads `{error:{code,message}}`, `{success:false,code,message}` or `{message}` bodies.
///
/// Unparseable bodies yield an empty detail.
#[must_use]
pub fn parse_error_body(body: &[u8]) -> ErrorDetail {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return ErrorDetail::default();
    };

    if let Some(error) = value.get("error").filter(|e| e.is_object()) {
        return ErrorDetail {
            code: error.get("code").and_then(scalar_to_string),
            message: error.get("message").and_then(scalar_to_string),
        };
    }

    ErrorDetail {
        code: value.get("code").and_then(scalar_to_string),
        message: value.get("message").and_then(scalar_to_string),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
