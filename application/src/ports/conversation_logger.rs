//! Port for the machine-readable conversation transcript.
//!
//! [`ConversationEvent`] is the closed set of things that happen during one
//! turn: the user's input, the persisted reply, and a stream that failed or
//! was abandoned by its connection. Writers decide the format and add the
//! timestamp.
//!
//! Operational diagnostics go through `tracing`; this port only carries the
//! transcript.

use serde::Serialize;

/// One transcript entry. Serializes with a snake_case `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// User input, recorded once it has been appended to history.
    UserMessage { scope: String, text: String },
    /// The full assistant reply, recorded once it has been persisted.
    AssistantResponse {
        scope: String,
        fragments: usize,
        text: String,
    },
    /// The backend failed mid-response; nothing was persisted.
    StreamFailed {
        scope: String,
        fragments: usize,
        error: String,
    },
    /// The consumer dropped the response before it finished.
    StreamAbandoned { scope: String, fragments: usize },
}

impl ConversationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ConversationEvent::UserMessage { .. } => "user_message",
            ConversationEvent::AssistantResponse { .. } => "assistant_response",
            ConversationEvent::StreamFailed { .. } => "stream_failed",
            ConversationEvent::StreamAbandoned { .. } => "stream_abandoned",
        }
    }
}

/// Sink for transcript events.
///
/// `log` is synchronous and infallible so it never disrupts a streaming
/// response; writers swallow their own failures.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
