//! Outgoing side of a connection.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use thiserror::Error;

/// The peer can no longer be written to.
#[derive(Error, Debug)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Anything a connection can write text frames to.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}

/// Collects frames in memory.
#[async_trait]
impl FrameSink for Vec<String> {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.push(text);
        Ok(())
    }
}
