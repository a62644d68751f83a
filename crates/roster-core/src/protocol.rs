//! WebSocket wire protocol.
//!
//! Every frame is a flat JSON object whose `type` field names the variant:
//!
//! | direction | `type` | shape |
//! |-----------|--------|-------|
//! | client → server | `PING` | `{"type":"PING"}` |
//! | server → client | `PONG` | `{"type":"PONG"}` |
//! | server → client | `ATTENDANCE` | `{"type":"ATTENDANCE","data":<employee>}` |
//! | server → client | `ERROR` | `{"type":"ERROR","message":"..."}` |
//!
//! Unrecognised tags decode to [`Message::Unknown`]. A frame that is not a JSON
//! object, or has no usable `type`, is a [`CodecError::Decode`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A protocol message.
///
/// `T` is the attendance payload. Inbound frames decode with the default
/// [`Value`]; producers encode with a borrowed domain type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message<T = Value> {
    /// Keepalive probe; answered with exactly one [`Message::Pong`].
    Ping,
    /// Reply to a [`Message::Ping`].
    Pong,
    /// An attendance change for one employee.
    Attendance {
        /// Opaque employee payload.
        data: T,
    },
    /// A server-side error notice.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Any message whose `type` tag is not recognised.
    #[serde(other)]
    Unknown,
}

impl<T> Message<T> {
    /// The wire tag of this variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Attendance { .. } => "ATTENDANCE",
            Self::Error { .. } => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The outbound payload could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    /// The inbound frame is not a well-formed message.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize a message to its JSON text frame.
pub fn encode<T: Serialize>(message: &Message<T>) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}

/// Parse a JSON text frame.
pub fn decode(text: &str) -> Result<Message, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn decode_ping() {
        assert_eq!(decode(r#"{"type":"PING"}"#).unwrap(), Message::Ping);
    }

    #[test]
    fn decode_ping_ignores_extra_fields() {
        let msg = decode(r#"{"type":"PING","timestamp":1700000000}"#).unwrap();
        assert_eq!(msg, Message::Ping);
    }

    #[test]
    fn decode_attendance_keeps_payload() {
        let msg = decode(r#"{"type":"ATTENDANCE","data":{"id":1,"name":"Alice"}}"#).unwrap();
        assert_eq!(
            msg,
            Message::Attendance {
                data: json!({"id": 1, "name": "Alice"})
            }
        );
    }

    #[test]
    fn decode_error_event() {
        let msg = decode(r#"{"type":"ERROR","message":"maintenance"}"#).unwrap();
        assert_eq!(
            msg,
            Message::Error {
                message: "maintenance".into()
            }
        );
    }

    #[test]
    fn unknown_tag_is_unknown() {
        let msg = decode(r#"{"type":"SUBSCRIBE","channel":"x"}"#).unwrap();
        assert_eq!(msg, Message::Unknown);
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert_eq!(decode(r#"{"type":"ping"}"#).unwrap(), Message::Unknown);
    }

    #[test]
    fn missing_type_is_decode_failure() {
        assert_matches!(decode(r#"{"data":1}"#), Err(CodecError::Decode(_)));
    }

    #[test]
    fn non_string_type_is_decode_failure() {
        assert_matches!(decode(r#"{"type":7}"#), Err(CodecError::Decode(_)));
    }

    #[test]
    fn invalid_json_is_decode_failure() {
        assert_matches!(decode("not json"), Err(CodecError::Decode(_)));
        assert_matches!(decode(""), Err(CodecError::Decode(_)));
        assert_matches!(decode("[1,2,3]"), Err(CodecError::Decode(_)));
    }

    #[test]
    fn encode_pong_is_flat_object() {
        let text = encode(&Message::<Value>::Pong).unwrap();
        assert_eq!(text, r#"{"type":"PONG"}"#);
    }

    #[test]
    fn encode_attendance_with_borrowed_payload() {
        let employee = json!({"id": 1, "name": "Alice"});
        let text = encode(&Message::Attendance { data: &employee }).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"type": "ATTENDANCE", "data": {"id": 1, "name": "Alice"}}));
    }

    #[test]
    fn encode_error_event() {
        let text = encode(&Message::<Value>::Error {
            message: "maintenance".into(),
        })
        .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"type": "ERROR", "message": "maintenance"}));
    }

    #[test]
    fn encode_unserializable_payload_fails() {
        // Tuple keys cannot become JSON object keys.
        let mut bad = HashMap::new();
        let _ = bad.insert((1, 2), "x");
        assert_matches!(
            encode(&Message::Attendance { data: &bad }),
            Err(CodecError::Encode(_))
        );
    }

    #[test]
    fn type_tags() {
        assert_eq!(Message::<Value>::Ping.type_tag(), "PING");
        assert_eq!(Message::<Value>::Pong.type_tag(), "PONG");
        assert_eq!(Message::Attendance { data: 1 }.type_tag(), "ATTENDANCE");
        assert_eq!(Message::<Value>::Unknown.type_tag(), "UNKNOWN");
    }
}
