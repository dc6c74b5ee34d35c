//! Application-level configuration.
//!
//! - [`SessionParams`]: context window and display limits for the orchestrator

pub mod session_params;

pub use session_params::{DEFAULT_DISPLAY_LIMIT, SessionParams};
