//! Offline adapter that repeats the latest user message.
//!
//! Useful for exercising the WebSocket surface without a model backend.

use ace_application::{GatewayError, ModelAdapter, StreamEvent, StreamHandle};
use ace_domain::{Message, Role};
use async_trait::async_trait;

const ECHO_PREFIX: &str = "Echo: ";

#[derive(Debug, Default)]
pub struct EchoAdapter;

impl EchoAdapter {
    pub fn new() -> Self {
        Self
    }

    fn reply(history: &[Message]) -> String {
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("{}{}", ECHO_PREFIX, last_user)
    }
}

#[async_trait]
impl ModelAdapter for EchoAdapter {
    fn name(&self) -> String {
        "echo".to_string()
    }

    async fn stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        let reply = Self::reply(history);
        Ok(StreamHandle::spawn(|tx| async move {
            // Word-sized fragments, trailing space kept on each.
            for word in reply.split_inclusive(' ') {
                if tx.send(StreamEvent::Delta(word.to_string())).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Completed).await;
        }))
    }

    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        Ok(Self::reply(history))
    }
}
