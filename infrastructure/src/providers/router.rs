use super::echo::EchoAdapter;
use super::http;
use super::ollama::OllamaAdapter;
use super::openai::OpenAiCompatibleAdapter;
use ace_application::{GatewayError, ModelAdapter, StreamHandle};
use ace_domain::{LlmConfig, Message, ProviderKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Connect phase limit for backend HTTP clients.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup-time failures while building the adapter.
///
/// All of these are fatal; the router is never rebuilt after startup.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("unsupported provider '{0}' (expected one of: {expected})", expected = supported_list())]
    UnsupportedProvider(String),

    #[error("provider '{provider}' requires the '{setting}' setting")]
    MissingSetting {
        provider: &'static str,
        setting: &'static str,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn supported_list() -> String {
    ProviderKind::all()
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Owns the one configured [`ModelAdapter`] and delegates to it.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct ModelRouter {
    kind: ProviderKind,
    adapter: Arc<dyn ModelAdapter>,
}

impl std::fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRouter")
            .field("kind", &self.kind)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

impl ModelRouter {
    /// Pick and construct the adapter named by `config.provider`.
    pub fn select(config: &LlmConfig) -> Result<Self, RouterError> {
        let kind: ProviderKind = config
            .provider
            .parse()
            .map_err(|_| RouterError::UnsupportedProvider(config.provider.clone()))?;

        let adapter: Arc<dyn ModelAdapter> = match kind {
            ProviderKind::Ollama => Arc::new(OllamaAdapter::new(
                http::build_client(CONNECT_TIMEOUT)?,
                config.model.clone(),
                config.endpoint.clone(),
                config.request_timeout,
            )),
            ProviderKind::OpenAi => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or(RouterError::MissingSetting {
                        provider: ProviderKind::OpenAi.as_str(),
                        setting: "api_key",
                    })?;
                Arc::new(OpenAiCompatibleAdapter::new(
                    http::build_client(CONNECT_TIMEOUT)?,
                    config.model.clone(),
                    config.endpoint.clone(),
                    api_key,
                    config.request_timeout,
                ))
            }
            ProviderKind::Echo => Arc::new(EchoAdapter::new()),
        };

        info!("Model router selected {}", adapter.name());
        Ok(Self { kind, adapter })
    }

    /// Wrap an already-built adapter.
    pub fn with_adapter(kind: ProviderKind, adapter: Arc<dyn ModelAdapter>) -> Self {
        Self { kind, adapter }
    }

    pub fn provider(&self) -> ProviderKind {
        self.kind
    }
}

#[async_trait]
impl ModelAdapter for ModelRouter {
    fn name(&self) -> String {
        self.adapter.name()
    }

    async fn stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        self.adapter.stream(history).await
    }

    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        self.adapter.complete(history).await
    }
}
