//! Infrastructure layer for ace-server
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: model backends, history stores, the
//! conversation log writer and configuration file loading.

pub mod config;
pub mod history;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, ConfigSource, FileConfig, FileHistoryConfig, FileLlmConfig,
    FileLoggingConfig, FileServerConfig,
};
pub use history::{InMemoryHistoryStore, SqliteHistoryStore};
pub use logging::JsonlConversationLogger;
pub use providers::{
    EchoAdapter, ModelRouter, OllamaAdapter, OpenAiCompatibleAdapter, RouterError,
};
