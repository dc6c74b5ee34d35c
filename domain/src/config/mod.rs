//! Configuration value objects for the domain layer
//!
//! These are domain concepts related to configuration that are
//! used across multiple layers.

mod history_backend;
mod llm_config;
mod provider;
pub mod validation;

pub use history_backend::HistoryBackend;
pub use llm_config::{DEFAULT_CONTEXT_MESSAGES, DEFAULT_REQUEST_TIMEOUT, LlmConfig};
pub use provider::ProviderKind;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
