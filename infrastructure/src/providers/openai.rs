//! OpenAI-compatible chat completions adapter.
//!
//! Works against api.openai.com and the many servers that mimic it
//! (vLLM, LM Studio, llama.cpp's server). Streaming uses server-sent
//! events terminated by a literal `[DONE]` data line.

use super::http;
use ace_application::{GatewayError, ModelAdapter, StreamEvent, StreamHandle};
use ace_domain::{Message, Model};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter for any server exposing `/v1/chat/completions`.
pub struct OpenAiCompatibleAdapter {
    client: reqwest::Client,
    model: Model,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiCompatibleAdapter {
    pub fn new(
        client: reqwest::Client,
        model: Model,
        base_url: Option<String>,
        api_key: String,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
        info!("OpenAI-compatible adapter: model {} at {}", model, base_url);
        Self {
            client,
            model,
            base_url,
            api_key,
            timeout,
        }
    }

    fn request(&self, history: &[Message], stream: bool) -> reqwest::RequestBuilder {
        let body = CompletionRequest {
            model: self.model.as_str(),
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream,
        };
        self.client
            .post(http::join_url(&self.base_url, "v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
    }
}

/// Decode one SSE `data:` payload.
fn decode_event(data: &str) -> Result<Option<StreamEvent>, GatewayError> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(Some(StreamEvent::Completed));
    }
    if data.is_empty() {
        return Ok(None);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| GatewayError::BackendProtocol(format!("invalid chunk: {}", e)))?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());
    Ok(content.map(StreamEvent::Delta))
}

#[async_trait]
impl ModelAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        debug!("Chat completion stream with {} messages", history.len());
        let response = http::send(self.request(history, true), self.timeout).await?;

        let handle = StreamHandle::spawn(|tx| async move {
            let mut events = response.bytes_stream().eventsource();

            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Failed(GatewayError::BackendProtocol(
                                e.to_string(),
                            )))
                            .await;
                        return;
                    }
                };
                trace!("SSE event: {}", event.data);
                match decode_event(&event.data) {
                    Ok(Some(StreamEvent::Completed)) => {
                        let _ = tx.send(StreamEvent::Completed).await;
                        return;
                    }
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            debug!("Completion stream consumer went away");
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Failed(e)).await;
                        return;
                    }
                }
            }

            let _ = tx
                .send(StreamEvent::Failed(GatewayError::BackendProtocol(
                    "stream ended before [DONE]".to_string(),
                )))
                .await;
        });

        Ok(handle.with_idle_timeout(self.timeout))
    }

    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        let response = http::send(self.request(history, false), self.timeout).await?;
        let body: CompletionResponse = tokio::time::timeout(self.timeout, response.json())
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
            .map_err(|e| GatewayError::BackendProtocol(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| GatewayError::BackendProtocol("response had no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server::serve_once;

    fn adapter(base_url: String) -> OpenAiCompatibleAdapter {
        OpenAiCompatibleAdapter::new(
            reqwest::Client::new(),
            Model::new("gpt-4o-mini").unwrap(),
            Some(base_url),
            "sk-test".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn decode_event_variants() {
        assert!(matches!(
            decode_event(r#"{"choices":[{"delta":{"content":"He"}}]}"#),
            Ok(Some(StreamEvent::Delta(ref s))) if s == "He"
        ));
        assert!(matches!(
            decode_event(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            Ok(None)
        ));
        assert!(matches!(decode_event(r#"{"choices":[]}"#), Ok(None)));
        assert!(matches!(
            decode_event(" [DONE] "),
            Ok(Some(StreamEvent::Completed))
        ));
        assert!(matches!(
            decode_event("{broken"),
            Err(GatewayError::BackendProtocol(_))
        ));
    }

    #[tokio::test]
    async fn streams_sse_fragments() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let (base_url, request) = serve_once(200, "text/event-stream", body).await;

        let mut handle = adapter(base_url)
            .stream(&[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "He");
        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "llo");
        assert!(handle.next_fragment().await.is_none());

        let served = request.await.unwrap();
        assert_eq!(served.path, "/v1/chat/completions");
        let sent: serde_json::Value = serde_json::from_str(&served.body).unwrap();
        assert_eq!(sent["stream"], true);
        assert_eq!(sent["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn missing_done_is_protocol_error() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n";
        let (base_url, _request) = serve_once(200, "text/event-stream", body).await;

        let result = adapter(base_url)
            .stream(&[Message::user("hi")])
            .await
            .unwrap()
            .collect_text()
            .await;
        assert!(matches!(result, Err(GatewayError::BackendProtocol(_))));
    }

    #[tokio::test]
    async fn unauthorized_is_protocol_error() {
        let (base_url, _request) =
            serve_once(401, "application/json", "{\"error\":\"bad key\"}").await;

        let result = adapter(base_url).stream(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(GatewayError::BackendProtocol(m)) if m.contains("401")));
    }

    #[tokio::test]
    async fn complete_reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}}]}"#;
        let (base_url, _request) = serve_once(200, "application/json", body).await;

        let text = adapter(base_url)
            .complete(&[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "Hi!");
    }
}
