//! History store implementations.
//!
//! - [`InMemoryHistoryStore`]: one history per session scope, lost on exit.
//! - [`SqliteHistoryStore`]: one durable stream shared by every scope.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;
