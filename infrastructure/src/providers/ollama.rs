//! Ollama adapter.
//!
//! Talks to a local (or remote) Ollama server over its `/api/chat`
//! endpoint. Streaming responses arrive as newline-delimited JSON records:
//!
//! ```text
//! {"message":{"role":"assistant","content":"He"},"done":false}
//! {"message":{"role":"assistant","content":"llo"},"done":false}
//! {"message":{"role":"assistant","content":""},"done":true}
//! ```
//!
//! The final `done` record may itself carry text.

use super::http;
use super::ndjson::LineBuffer;
use ace_application::{GatewayError, ModelAdapter, StreamEvent, StreamHandle};
use ace_domain::{Message, Model};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Ollama's default listen address.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
}

/// Roles are identical on both sides, so conversion is a rename only.
#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Adapter for Ollama's chat API.
pub struct OllamaAdapter {
    client: reqwest::Client,
    model: Model,
    base_url: String,
    timeout: Duration,
}

impl OllamaAdapter {
    pub fn new(
        client: reqwest::Client,
        model: Model,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        info!("Ollama adapter: model {} at {}", model, base_url);
        Self {
            client,
            model,
            base_url,
            timeout,
        }
    }

    fn request(&self, history: &[Message], stream: bool) -> reqwest::RequestBuilder {
        let body = ChatRequest {
            model: self.model.as_str(),
            messages: to_ollama_messages(history),
            stream,
        };
        self.client
            .post(http::join_url(&self.base_url, "api/chat"))
            .json(&body)
    }
}

fn to_ollama_messages(history: &[Message]) -> Vec<OllamaMessage<'_>> {
    history
        .iter()
        .map(|m| OllamaMessage {
            role: m.role.as_str(),
            content: &m.content,
        })
        .collect()
}

/// What one NDJSON record contributes to the stream.
#[derive(Debug, Default, PartialEq, Eq)]
struct Record {
    /// Non-empty text carried by the record.
    delta: Option<String>,
    /// Set on the final record; emitted after `delta`.
    done: bool,
}

fn decode_line(line: &str) -> Result<Record, GatewayError> {
    let chunk: ChatChunk = serde_json::from_str(line)
        .map_err(|e| GatewayError::BackendProtocol(format!("invalid chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(GatewayError::BackendProtocol(error));
    }
    Ok(Record {
        delta: chunk
            .message
            .map(|m| m.content)
            .filter(|content| !content.is_empty()),
        done: chunk.done,
    })
}

/// Forward one decoded record. Returns `false` once the stream is over,
/// either because it ended or because the consumer went away.
async fn forward(tx: &mpsc::Sender<StreamEvent>, record: Result<Record, GatewayError>) -> bool {
    let record = match record {
        Ok(record) => record,
        Err(e) => {
            let _ = tx.send(StreamEvent::Failed(e)).await;
            return false;
        }
    };
    if let Some(delta) = record.delta
        && tx.send(StreamEvent::Delta(delta)).await.is_err()
    {
        debug!("Ollama stream consumer went away");
        return false;
    }
    if record.done {
        let _ = tx.send(StreamEvent::Completed).await;
        return false;
    }
    true
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
    fn name(&self) -> String {
        format!("ollama/{}", self.model)
    }

    async fn stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        debug!("Ollama stream request with {} messages", history.len());
        let response = http::send(self.request(history, true), self.timeout).await?;

        let handle = StreamHandle::spawn(|tx| async move {
            let mut body = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Failed(http::map_send_error(e))).await;
                        return;
                    }
                };
                for line in lines.push(&chunk) {
                    trace!("Ollama chunk: {}", line);
                    if !forward(&tx, decode_line(&line)).await {
                        return;
                    }
                }
            }

            if let Some(line) = lines.finish()
                && !forward(&tx, decode_line(&line)).await
            {
                return;
            }
            let _ = tx
                .send(StreamEvent::Failed(GatewayError::BackendProtocol(
                    "stream ended without a done record".to_string(),
                )))
                .await;
        });

        Ok(handle.with_idle_timeout(self.timeout))
    }

    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        debug!("Ollama chat request with {} messages", history.len());
        let response = http::send(self.request(history, false), self.timeout).await?;
        let chunk: ChatChunk = tokio::time::timeout(self.timeout, response.json())
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
            .map_err(|e| GatewayError::BackendProtocol(e.to_string()))?;

        if let Some(error) = chunk.error {
            return Err(GatewayError::BackendProtocol(error));
        }
        Ok(chunk.message.map(|m| m.content).unwrap_or_default())
    }
}
