//! Wire message types.
//!
//! Every frame is a JSON object `{"type": <discriminator>, "payload": {...}}`.
//! Payload fields are camelCase on the wire; `connection.ping` and
//! `connection.pong` carry no payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const USER_INPUT_TEXT: &str = "user.input.text";
pub const CONNECTION_PING: &str = "connection.ping";
pub const ASSISTANT_RESPONSE_TEXT: &str = "assistant.response.text";
pub const CONNECTION_PONG: &str = "connection.pong";
pub const ERROR: &str = "error";

/// All wire message variants, incoming and outgoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WireMessage {
    #[serde(rename = "user.input.text")]
    UserInputText(TextInputPayload),
    #[serde(rename = "connection.ping")]
    ConnectionPing,
    #[serde(rename = "assistant.response.text")]
    AssistantResponseText(TextResponsePayload),
    #[serde(rename = "connection.pong")]
    ConnectionPong,
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl WireMessage {
    /// The discriminator this message is sent under.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserInputText(_) => USER_INPUT_TEXT,
            Self::ConnectionPing => CONNECTION_PING,
            Self::AssistantResponseText(_) => ASSISTANT_RESPONSE_TEXT,
            Self::ConnectionPong => CONNECTION_PONG,
            Self::Error(_) => ERROR,
        }
    }

    pub fn response(text: impl Into<String>, is_partial: bool, session_id: &str) -> Self {
        Self::AssistantResponseText(TextResponsePayload {
            text: text.into(),
            is_partial,
            session_id: session_id.to_string(),
        })
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code,
            message: message.into(),
            context: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInputPayload {
    pub text: String,
    #[serde(alias = "session_id")]
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponsePayload {
    pub text: String,
    /// `false` only on the last frame of a response.
    #[serde(alias = "is_partial")]
    pub is_partial: bool,
    #[serde(alias = "session_id")]
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ErrorPayload {
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Machine-readable error codes sent in `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed frame or unrecognized discriminator.
    InvalidMessage,
    /// Recognized discriminator with invalid fields.
    InvalidPayload,
    /// The model backend failed or timed out.
    BackendError,
    /// The history store failed.
    PersistenceError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::BackendError => "BACKEND_ERROR",
            Self::PersistenceError => "PERSISTENCE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ProtocolError {
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidMessage,
            message: message.into(),
        }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidPayload,
            message: message.into(),
        }
    }

    /// The `error` frame reporting this failure to the peer.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage::error(self.code, self.message.clone())
    }
}
