//! Presentation layer for ace-server
//!
//! This crate contains the WebSocket surface (wire protocol, codec,
//! connection manager and listener), the CLI definitions and console
//! output formatting.

pub mod cli;
pub mod output;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use server::{ConnectionManager, Server};
