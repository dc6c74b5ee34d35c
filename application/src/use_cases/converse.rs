//! Converse use case.
//!
//! [`SessionOrchestrator`] turns one user input into a streamed model
//! response:
//!
//! 1. Append the user message to the history for the scope
//! 2. Read back the most recent `context_messages` messages, oldest first
//! 3. Start the adapter's streaming call with that window
//! 4. Forward every fragment immediately while accumulating it
//! 5. On exhaustion, append the accumulated text as one assistant message
//! 6. On a backend error, propagate it and persist nothing for the turn
//!
//! Steps 1–3 run inside [`SessionOrchestrator::handle_user_message`]; steps
//! 4–6 run as the caller drains the returned [`ResponseStream`].

use crate::config::SessionParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::history_store::{HistoryError, HistoryStore};
use crate::ports::model_adapter::{GatewayError, ModelAdapter, StreamHandle};
use ace_domain::Message;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while handling a user message.
#[derive(Error, Debug)]
pub enum ConverseError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Use case for streaming a model response to one user input.
///
/// Shared read-only across every connection; all mutable state lives in the
/// history store.
pub struct SessionOrchestrator {
    adapter: Arc<dyn ModelAdapter>,
    history: Arc<dyn HistoryStore>,
    params: SessionParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SessionOrchestrator {
    pub fn new(
        adapter: Arc<dyn ModelAdapter>,
        history: Arc<dyn HistoryStore>,
        params: SessionParams,
    ) -> Self {
        Self {
            adapter,
            history,
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Record `text` for `scope` and start streaming the model's reply.
    ///
    /// The user message is persisted before the model is called, so it is
    /// recorded even when the call fails.
    pub async fn handle_user_message(
        &self,
        scope: &str,
        text: &str,
    ) -> Result<ResponseStream, ConverseError> {
        self.history.append(scope, Message::user(text)).await?;
        self.conversation_logger.log(ConversationEvent::UserMessage {
            scope: scope.to_string(),
            text: text.to_string(),
        });

        let window = self
            .history
            .recent(scope, self.params.context_messages)
            .await?;
        debug!(
            scope,
            window = window.len(),
            limit = self.params.context_messages,
            "Assembled context window"
        );

        let handle = self.adapter.stream(&window).await?;
        info!(scope, adapter = %self.adapter.name(), "Streaming response");

        Ok(ResponseStream {
            scope: scope.to_string(),
            handle,
            accumulated: String::new(),
            fragments: 0,
            state: StreamState::Streaming,
            history: Arc::clone(&self.history),
            conversation_logger: Arc::clone(&self.conversation_logger),
        })
    }

    /// Load recent messages for catch-up display.
    ///
    /// Independent of the context window used for model calls.
    pub async fn get_recent_history(
        &self,
        scope: &str,
        display_limit: usize,
    ) -> Result<Vec<Message>, ConverseError> {
        Ok(self.history.recent(scope, display_limit).await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Completed,
    Failed,
}

/// The fragments of one model response, in emission order.
///
/// Single consumer, not restartable. Dropping it before exhaustion cancels
/// the backend call and discards the accumulated text.
pub struct ResponseStream {
    scope: String,
    handle: StreamHandle,
    accumulated: String,
    fragments: usize,
    state: StreamState,
    history: Arc<dyn HistoryStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ResponseStream {
    /// Receive the next fragment.
    ///
    /// Returns `None` once the response has been fully streamed and the
    /// assistant message persisted. After an error the stream is finished.
    pub async fn next_fragment(&mut self) -> Option<Result<String, ConverseError>> {
        if self.state != StreamState::Streaming {
            return None;
        }

        match self.handle.next_fragment().await {
            Some(Ok(fragment)) => {
                self.accumulated.push_str(&fragment);
                self.fragments += 1;
                Some(Ok(fragment))
            }
            Some(Err(e)) => {
                self.state = StreamState::Failed;
                warn!(
                    scope = %self.scope,
                    fragments = self.fragments,
                    "Response stream failed: {}",
                    e
                );
                self.conversation_logger.log(ConversationEvent::StreamFailed {
                    scope: self.scope.clone(),
                    fragments: self.fragments,
                    error: e.to_string(),
                });
                self.accumulated.clear();
                Some(Err(e.into()))
            }
            None => {
                // Zero fragments still records an (empty) assistant turn so
                // the history keeps alternating user/assistant.
                self.state = StreamState::Completed;
                let full_text = std::mem::take(&mut self.accumulated);
                let bytes = full_text.len();
                if let Err(e) = self
                    .history
                    .append(&self.scope, Message::assistant(full_text.clone()))
                    .await
                {
                    self.state = StreamState::Failed;
                    warn!(scope = %self.scope, "Failed to persist response: {}", e);
                    return Some(Err(e.into()));
                }
                debug!(
                    scope = %self.scope,
                    fragments = self.fragments,
                    bytes,
                    "Response persisted"
                );
                self.conversation_logger.log(ConversationEvent::AssistantResponse {
                    scope: self.scope.clone(),
                    fragments: self.fragments,
                    text: full_text,
                });
                None
            }
        }
    }

    /// Drain the stream and return the full response text.
    pub async fn collect(mut self) -> Result<String, ConverseError> {
        let mut full_text = String::new();
        while let Some(fragment) = self.next_fragment().await {
            full_text.push_str(&fragment?);
        }
        Ok(full_text)
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        if self.state == StreamState::Streaming {
            debug!(
                scope = %self.scope,
                fragments = self.fragments,
                "Response stream abandoned before completion"
            );
            self.conversation_logger.log(ConversationEvent::StreamAbandoned {
                scope: self.scope.clone(),
                fragments: self.fragments,
            });
        }
    }
}
