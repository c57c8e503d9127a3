//! Error taxonomy and payload normalization
//!
//! Bridges report failures in several shapes (nested objects, flat objects,
//! bare strings). Everything is funnelled into a single message string here
//! before it reaches the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const UNKNOWN_ERROR: &str = "Unknown speech recognition error";

/// Failure raised by a bridge call (`start`, `stop`, `cancel`, queries)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("speech bridge call failed: {message}")]
pub struct BridgeError {
    message: String,
}

impl BridgeError {
    pub fn call(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Raw message without the wrapper prefix
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

/// Voice search failure kinds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    /// Bridge missing or structurally non-functional
    #[error("voice recognition is not available on this device")]
    ModuleUnavailable,
    /// User declined microphone access for this attempt
    #[error("microphone permission was denied")]
    PermissionDenied,
    /// A bridge call itself failed
    #[error("{0}")]
    Transport(String),
}

impl From<BridgeError> for VoiceError {
    fn from(err: BridgeError) -> Self {
        Self::Transport(err.message())
    }
}

/// Normalized error delivered to the caller's `on_error` callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionError {
    pub message: String,
}

impl RecognitionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RecognitionError {}

impl From<&VoiceError> for RecognitionError {
    fn from(err: &VoiceError) -> Self {
        Self::new(err.to_string())
    }
}

/// Normalize a bridge error payload into a `RecognitionError`
///
/// Accepted shapes, in priority order:
/// - `{ "error": { "message": "..." } }`
/// - `{ "error": "..." }`
/// - `{ "message": "..." }`
/// - `"..."`
/// - `{ "code": ... }` / `{ "error": { "code": ... } }`
pub fn normalize_error(payload: &Value) -> RecognitionError {
    RecognitionError::new(extract_message(payload).unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
}

fn extract_message(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            if let Some(inner) = map.get("error") {
                if let Some(message) = extract_message(inner) {
                    return Some(message);
                }
            }
            if let Some(Value::String(message)) = map.get("message") {
                if !message.is_empty() {
                    return Some(message.clone());
                }
            }
            map.get("code").and_then(code_message)
        }
        _ => None,
    }
}

fn code_message(code: &Value) -> Option<String> {
    match code {
        Value::String(s) if !s.is_empty() => Some(format!("Speech recognition error ({})", s)),
        Value::Number(n) => Some(format!("Speech recognition error ({})", n)),
        _ => None,
    }
}

/// First transcription candidate of a results payload, if any
///
/// Accepts `{ "value": ["..."] }` or a bare array. Empty or non-string
/// candidates count as absent.
pub fn first_candidate(payload: &Value) -> Option<String> {
    let candidates = match payload {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("value") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    candidates
        .first()
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_nested_error_message() {
        let err = normalize_error(&json!({ "error": { "message": "no-match" } }));
        assert_eq!(err.message, "no-match");
    }

    #[test]
    fn test_normalize_flat_message() {
        assert_eq!(normalize_error(&json!({ "message": "x" })).message, "x");
    }

    #[test]
    fn test_normalize_bare_string() {
        assert_eq!(normalize_error(&json!("y")).message, "y");
    }

    #[test]
    fn test_normalize_error_string_field() {
        assert_eq!(
            normalize_error(&json!({ "error": "7/No match" })).message,
            "7/No match"
        );
    }

    #[test]
    fn test_normalize_code_only() {
        assert_eq!(
            normalize_error(&json!({ "error": { "code": 7 } })).message,
            "Speech recognition error (7)"
        );
    }

    #[test]
    fn test_normalize_garbage_falls_back() {
        assert_eq!(normalize_error(&Value::Null).message, UNKNOWN_ERROR);
        assert_eq!(normalize_error(&json!({ "error": {} })).message, UNKNOWN_ERROR);
        assert_eq!(normalize_error(&json!(42)).message, UNKNOWN_ERROR);
    }

    #[test]
    fn test_first_candidate_shapes() {
        assert_eq!(
            first_candidate(&json!({ "value": ["milk", "mill"] })),
            Some("milk".to_string())
        );
        assert_eq!(first_candidate(&json!(["eggs"])), Some("eggs".to_string()));
        assert_eq!(first_candidate(&json!({ "value": [] })), None);
        assert_eq!(first_candidate(&json!({ "value": [""] })), None);
        assert_eq!(first_candidate(&json!({ "value": [3] })), None);
        assert_eq!(first_candidate(&json!({})), None);
        assert_eq!(first_candidate(&Value::Null), None);
    }

    #[test]
    fn test_bridge_error_converts_to_transport() {
        let err: VoiceError = BridgeError::call("device busy").into();
        assert_eq!(err, VoiceError::Transport("device busy".to_string()));
        assert_eq!(RecognitionError::from(&err).message, "device busy");
    }
}
