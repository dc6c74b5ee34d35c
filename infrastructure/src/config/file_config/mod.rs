//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized as plain strings and numbers; the `parse_*`
//! methods turn them into domain types and report problems as
//! [`ConfigIssue`]s.

mod history;
mod llm;
mod logging;
mod server;

pub use history::FileHistoryConfig;
pub use llm::FileLlmConfig;
pub use logging::FileLoggingConfig;
pub use server::FileServerConfig;

use ace_application::SessionParams;
use ace_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Listener settings
    pub server: FileServerConfig,
    /// Model backend selection
    pub llm: FileLlmConfig,
    /// History backend selection
    pub history: FileHistoryConfig,
    /// Log outputs
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Any issue with [`Severity::Error`](ace_domain::Severity::Error)
    /// must abort startup.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.llm.parse_provider().1);
        issues.extend(self.llm.parse_model().1);
        issues.extend(self.llm.check_settings());
        issues.extend(self.history.parse_backend().1);
        issues
    }

    /// Orchestrator tuning derived from `[llm]` and `[history]`.
    pub fn session_params(&self) -> SessionParams {
        SessionParams::default()
            .with_context_messages(self.llm.context_messages)
            .with_display_limit(self.history.display_limit)
    }

    /// Render the effective configuration as TOML, with credentials masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}
