//! Application layer for ace-server
//!
//! This crate contains the session orchestration use case, the port
//! definitions its adapters implement, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::SessionParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    history_store::{HistoryError, HistoryStore},
    model_adapter::{GatewayError, ModelAdapter, StreamEvent, StreamHandle},
};
pub use use_cases::converse::{ConverseError, ResponseStream, SessionOrchestrator};
