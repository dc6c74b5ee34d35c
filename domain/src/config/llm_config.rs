//! LLM configuration value object

use crate::core::model::Model;
use std::time::Duration;

/// Default number of recent messages handed to the model per call.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 50;

/// Default bound on how long a backend may stay silent mid-request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Backend selection (Value Object)
///
/// Built once from the loaded configuration and consumed by the model
/// router to construct the adapter. Immutable afterwards. The provider is
/// kept as the configured identifier; the router resolves it against the
/// known [`ProviderKind`](super::ProviderKind)s.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: String,
    pub model: Model,
    /// Backend base URL; `None` uses the adapter's default
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Context window size, counted in messages
    pub context_messages: usize,
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, model: Model) -> Self {
        Self {
            provider: provider.into(),
            model,
            endpoint: None,
            api_key: None,
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_context_messages(mut self, count: usize) -> Self {
        self.context_messages = count;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// Keep credentials out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("context_messages", &self.context_messages)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
