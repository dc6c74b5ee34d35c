//! Provider kind value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backends the model router knows how to construct.
///
/// The set is closed: an identifier outside it is a fatal startup error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local or remote Ollama server (NDJSON streaming)
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions endpoint (SSE streaming)
    OpenAi,
    /// Development backend that streams the user's input back
    Echo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Echo => "echo",
        }
    }

    /// All known provider identifiers, in display order
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::Ollama, ProviderKind::OpenAi, ProviderKind::Echo]
    }

    /// Whether requests to this backend must carry a credential
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAi),
            "echo" => Ok(ProviderKind::Echo),
            _ => Err(DomainError::UnsupportedProvider(s.to_string())),
        }
    }
}
