//! Domain layer for ace-server
//!
//! This crate contains the conversation entities and configuration value
//! objects shared by every other layer. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Message**: one immutable role/content pair in a conversation history
//! - **Scope**: the client-supplied session identifier a history belongs to
//! - **LlmConfig**: the provider/model selection consumed once by the router

pub mod config;
pub mod core;
pub mod session;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigIssueCode, DEFAULT_CONTEXT_MESSAGES, DEFAULT_REQUEST_TIMEOUT,
    HistoryBackend, LlmConfig, ProviderKind, Severity,
};
pub use core::{error::DomainError, model::Model};
pub use session::entities::{Message, Role};
