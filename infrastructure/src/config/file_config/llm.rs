//! Model backend configuration from TOML (`[llm]` section)

use ace_domain::{
    ConfigIssue, ConfigIssueCode, DEFAULT_CONTEXT_MESSAGES, DEFAULT_REQUEST_TIMEOUT, LlmConfig,
    Model, ProviderKind,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted for the OpenAI credential by default.
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Raw model backend configuration from TOML
///
/// # Example
///
/// ```toml
/// [llm]
/// provider = "openai"                  # ollama | openai | echo
/// model = "gpt-4o-mini"
/// endpoint = "http://localhost:8080"   # optional, adapter default otherwise
/// api_key_env = "OPENAI_API_KEY"       # preferred over api_key
/// context_messages = 50
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    /// Direct API key (not recommended; use `api_key_env` instead).
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Messages of recent history sent with each request.
    pub context_messages: usize,
    /// Longest silence tolerated from the backend, in seconds.
    pub timeout_secs: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default().as_str().to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            api_key_env: None,
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl FileLlmConfig {
    /// Parse the provider identifier, collecting an issue if it is unknown.
    pub fn parse_provider(&self) -> (Option<ProviderKind>, Vec<ConfigIssue>) {
        match self.provider.parse::<ProviderKind>() {
            Ok(kind) => (Some(kind), Vec::new()),
            Err(_) => {
                let expected: Vec<_> = ProviderKind::all().iter().map(|k| k.as_str()).collect();
                let issue = ConfigIssue::error(
                    ConfigIssueCode::UnsupportedProvider {
                        value: self.provider.clone(),
                    },
                    format!(
                        "llm.provider: unknown provider '{}' (expected one of: {})",
                        self.provider,
                        expected.join(", ")
                    ),
                );
                (None, vec![issue])
            }
        }
    }

    /// Parse the model identifier, collecting an issue if it is empty.
    pub fn parse_model(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        match Model::new(&self.model) {
            Ok(model) => (Some(model), Vec::new()),
            Err(_) => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModel,
                    "llm.model: model name cannot be empty",
                )],
            ),
        }
    }

    /// The environment variable the credential is read from, if any.
    pub fn api_key_env_var(&self) -> Option<String> {
        if let Some(name) = &self.api_key_env {
            return Some(name.clone());
        }
        match self.provider.parse::<ProviderKind>() {
            Ok(ProviderKind::OpenAi) => Some(DEFAULT_OPENAI_KEY_ENV.to_string()),
            _ => None,
        }
    }

    /// Credential from `api_key`, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        let direct = self.api_key.clone().filter(|k| !k.trim().is_empty());
        direct.or_else(|| {
            self.api_key_env_var()
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.trim().is_empty())
        })
    }

    /// Provider-specific checks that go beyond parsing.
    pub fn check_settings(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let Some(kind) = self.parse_provider().0 else {
            return issues;
        };

        if kind.requires_api_key() && self.resolve_api_key().is_none() {
            let env_var = self
                .api_key_env_var()
                .unwrap_or_else(|| DEFAULT_OPENAI_KEY_ENV.to_string());
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingApiKey {
                    env_var: env_var.clone(),
                },
                format!(
                    "llm: provider '{}' needs an API key (set llm.api_key or ${})",
                    kind, env_var
                ),
            ));
        }

        if !kind.requires_api_key() && self.api_key.is_some() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::IgnoredSetting {
                    field: "llm.api_key".to_string(),
                },
                format!("llm.api_key is ignored by provider '{}'", kind),
            ));
        }

        if kind == ProviderKind::Echo && self.endpoint.is_some() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::IgnoredSetting {
                    field: "llm.endpoint".to_string(),
                },
                "llm.endpoint is ignored by the echo provider",
            ));
        }

        if self.context_messages == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::EmptyContextWindow,
                "llm.context_messages is 0: the model will see no history, not even the new message",
            ));
        }

        issues
    }

    /// Build the router's input.
    ///
    /// Only the model is checked here; the provider identifier is passed
    /// through for the router to resolve.
    pub fn to_llm_config(&self) -> Result<LlmConfig, ace_domain::DomainError> {
        let model = Model::new(&self.model)?;
        let mut config = LlmConfig::new(self.provider.trim(), model)
            .with_context_messages(self.context_messages)
            .with_request_timeout(Duration::from_secs(self.timeout_secs.max(1)));
        if let Some(endpoint) = self.endpoint.as_ref().filter(|e| !e.trim().is_empty()) {
            config = config.with_endpoint(endpoint.trim());
        }
        if let Some(key) = self.resolve_api_key() {
            config = config.with_api_key(key);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm(provider: &str) -> FileLlmConfig {
        FileLlmConfig {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(llm("Ollama").parse_provider().0, Some(ProviderKind::Ollama));

        let (kind, issues) = llm("gemini").parse_provider();
        assert!(kind.is_none());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert!(issues[0].message.contains("gemini"));
    }

    #[test]
    fn test_parse_model_rejects_blank() {
        let config = FileLlmConfig {
            model: "   ".to_string(),
            ..Default::default()
        };
        let (model, issues) = config.parse_model();
        assert!(model.is_none());
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyModel);
    }

    #[test]
    fn test_openai_requires_key() {
        let config = FileLlmConfig {
            api_key_env: Some("ACE_TEST_SURELY_UNSET_KEY".to_string()),
            ..llm("openai")
        };
        let issues = config.check_settings();
        assert!(issues.iter().any(|i| i.is_error()
            && i.code
                == ConfigIssueCode::MissingApiKey {
                    env_var: "ACE_TEST_SURELY_UNSET_KEY".to_string()
                }));

        let config = FileLlmConfig {
            api_key: Some("sk-direct".to_string()),
            ..llm("openai")
        };
        assert!(config.check_settings().is_empty());
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-direct"));
    }

    #[test]
    fn test_ignored_settings_warn() {
        let config = FileLlmConfig {
            api_key: Some("unused".to_string()),
            endpoint: Some("http://x".to_string()),
            context_messages: 0,
            ..llm("echo")
        };
        let issues = config.check_settings();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn test_to_llm_config() {
        let config = FileLlmConfig {
            provider: " ollama ".to_string(),
            model: "qwen3:8b".to_string(),
            endpoint: Some("http://gpu-box:11434".to_string()),
            context_messages: 12,
            timeout_secs: 30,
            ..Default::default()
        };
        let llm = config.to_llm_config().unwrap();
        assert_eq!(llm.provider, "ollama");
        assert_eq!(llm.model.as_str(), "qwen3:8b");
        assert_eq!(llm.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(llm.context_messages, 12);
        assert_eq!(llm.request_timeout, Duration::from_secs(30));
        assert!(llm.api_key.is_none());
    }
}
