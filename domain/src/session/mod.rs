//! Conversation history domain.
//!
//! - [`entities::Message`]: a single immutable message within a history
//! - [`entities::Role`]: who authored a message

pub mod entities;
