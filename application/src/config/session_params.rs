//! Session parameters for orchestrator window control.
//!
//! [`SessionParams`] groups the static limits the
//! [`SessionOrchestrator`](crate::use_cases::converse::SessionOrchestrator)
//! applies when reading history back.

/// Default number of messages returned for reconnect/catch-up display.
pub const DEFAULT_DISPLAY_LIMIT: usize = 100;

/// History window limits.
///
/// | Limit              | Used by                  |
/// |--------------------|--------------------------|
/// | `context_messages` | model calls              |
/// | `display_limit`    | catch-up history display |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    /// Number of most recent messages handed to the model per call.
    pub context_messages: usize,
    /// Number of most recent messages returned for display.
    pub display_limit: usize,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            context_messages: ace_domain::config::DEFAULT_CONTEXT_MESSAGES,
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }
}

impl SessionParams {
    pub fn with_context_messages(mut self, count: usize) -> Self {
        self.context_messages = count;
        self
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SessionParams::default();
        assert_eq!(params.context_messages, 50);
        assert_eq!(params.display_limit, DEFAULT_DISPLAY_LIMIT);
    }

    #[test]
    fn test_builders_are_independent() {
        let params = SessionParams::default()
            .with_context_messages(2)
            .with_display_limit(10);
        assert_eq!(params.context_messages, 2);
        assert_eq!(params.display_limit, 10);
    }
}
