//! Log output configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [logging]
/// file = "logs/ace-server.log"               # diagnostic log, in addition to stderr
/// conversation_log = "logs/conversation.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub file: Option<PathBuf>,
    pub conversation_log: Option<PathBuf>,
}
