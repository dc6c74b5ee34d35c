//! Protocol codec: raw text frames to [`WireMessage`]s and back.
//!
//! Stateless. Decoding accepts only the variants a client may send
//! (`user.input.text`, `connection.ping`); encoding handles every variant.

use super::protocol::{
    CONNECTION_PING, ErrorCode, ProtocolError, TextInputPayload, USER_INPUT_TEXT, WireMessage,
};
use serde_json::Value;
use tracing::error;

/// Sent if an outgoing message ever fails to serialize.
const ENCODE_FAILURE_FRAME: &str =
    r#"{"type":"error","payload":{"code":"INVALID_MESSAGE","message":"failed to encode response"}}"#;

/// Decode one incoming text frame.
pub fn decode(raw: &str) -> Result<WireMessage, ProtocolError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ProtocolError::invalid_message(format!("Malformed JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(ProtocolError::invalid_message(
            "Message must be an object with a 'type' field",
        ));
    };

    let kind = match object.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => {
            return Err(ProtocolError::invalid_message(format!(
                "Unknown message type: {}",
                other
            )));
        }
        None => {
            return Err(ProtocolError::invalid_message(
                "Message must have a 'type' field",
            ));
        }
    };

    match kind.as_str() {
        CONNECTION_PING => Ok(WireMessage::ConnectionPing),
        USER_INPUT_TEXT => {
            let payload = object.remove("payload").ok_or_else(|| {
                ProtocolError::invalid_payload(format!("Invalid payload for {}: missing payload", kind))
            })?;
            let payload: TextInputPayload = serde_json::from_value(payload).map_err(|e| {
                ProtocolError::invalid_payload(format!("Invalid payload for {}: {}", kind, e))
            })?;
            Ok(WireMessage::UserInputText(payload))
        }
        _ => Err(ProtocolError::invalid_message(format!(
            "Unknown message type: {}",
            kind
        ))),
    }
}

/// Encode an outgoing message.
pub fn encode(message: &WireMessage) -> String {
    match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode {} message: {}", message.kind(), e);
            ENCODE_FAILURE_FRAME.to_string()
        }
    }
}

/// Encode the `error` frame for a failed decode.
pub fn encode_error(error: &ProtocolError) -> String {
    encode(&error.to_wire())
}

/// Shorthand used when the error is not a decode failure.
pub fn encode_error_code(code: ErrorCode, message: impl Into<String>) -> String {
    encode(&WireMessage::error(code, message))
}
