//! History store port
//!
//! Defines the append-only conversation history the orchestrator reads
//! its context window from.

use ace_domain::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur in a history store
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only conversation history.
///
/// Both operations take a `scope` (the client's session identifier).
/// Scoped stores keep one history per scope; global stores ignore it and
/// keep one continuous stream. Appends to one scope are linearized, and a
/// `recent` read never observes a half-applied append.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append `message` at the end of the history for `scope`.
    async fn append(&self, scope: &str, message: Message) -> Result<(), HistoryError>;

    /// The last `limit` messages for `scope`, oldest first.
    ///
    /// Returns everything when fewer than `limit` messages are stored.
    async fn recent(&self, scope: &str, limit: usize) -> Result<Vec<Message>, HistoryError>;

    /// Short identifier used in logs.
    fn describe(&self) -> &'static str;
}
