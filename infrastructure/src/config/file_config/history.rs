//! History configuration from TOML (`[history]` section)

use ace_domain::{ConfigIssue, ConfigIssueCode, HistoryBackend};
use ace_application::config::DEFAULT_DISPLAY_LIMIT;
use serde::{Deserialize, Serialize};

/// Raw history configuration from TOML
///
/// ```toml
/// [history]
/// backend = "sqlite"      # or "memory" for per-session, non-durable history
/// display_limit = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    pub backend: String,
    /// Messages shown by `ace-server history`.
    pub display_limit: usize,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default().as_str().to_string(),
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }
}

impl FileHistoryConfig {
    pub fn parse_backend(&self) -> (Option<HistoryBackend>, Vec<ConfigIssue>) {
        match self.backend.parse::<HistoryBackend>() {
            Ok(backend) => (Some(backend), Vec::new()),
            Err(_) => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidHistoryBackend {
                        value: self.backend.clone(),
                    },
                    format!(
                        "history.backend: unknown value '{}' (expected 'memory' or 'sqlite')",
                        self.backend
                    ),
                )],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        let config = FileHistoryConfig {
            backend: "memory".to_string(),
            ..Default::default()
        };
        assert_eq!(config.parse_backend().0, Some(HistoryBackend::Memory));

        let config = FileHistoryConfig {
            backend: "redis".to_string(),
            ..Default::default()
        };
        let (backend, issues) = config.parse_backend();
        assert!(backend.is_none());
        assert!(issues[0].is_error());
    }
}
