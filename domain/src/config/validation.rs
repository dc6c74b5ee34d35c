//! Structured configuration issues.
//!
//! Configuration loading reports problems as [`ConfigIssue`]s instead of
//! failing on the first one, so startup can print every issue at once and
//! abort only when an [`Severity::Error`] is present.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the server cannot start with this configuration.
    Error,
    /// Non-fatal: the server starts but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `llm.provider` names no known adapter.
    UnsupportedProvider { value: String },
    /// `llm.model` is empty.
    EmptyModel,
    /// The provider needs a credential and none was found.
    MissingApiKey { env_var: String },
    /// `history.backend` is not `memory` or `sqlite`.
    InvalidHistoryBackend { value: String },
    /// `llm.context_messages` is zero, so the model would see nothing.
    EmptyContextWindow,
    /// A setting is present but ignored by the selected provider/backend.
    IgnoredSetting { field: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
