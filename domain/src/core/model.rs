//! Model value object identifying the backend model

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the model a backend should generate with (Value Object)
///
/// The vocabulary is owned by the backend (`qwen3:8b`, `gpt-4o-mini`, ...),
/// so the domain only guarantees the identifier is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidModel(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::new(s)
    }
}
