//! Listener configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw server configuration from TOML
///
/// # Example
///
/// ```toml
/// [server]
/// host = "127.0.0.1"
/// port = 8000
/// data_dir = "data"     # SQLite history lives at <data_dir>/ace.db
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl FileServerConfig {
    /// `host:port`, suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
