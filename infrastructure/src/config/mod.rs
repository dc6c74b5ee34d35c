//! Configuration file loading for ace-server
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `ACE_<SECTION>__<KEY>` (e.g. `ACE_LLM__MODEL`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./ace.toml` or `./.ace.toml`
//! 4. Global: `$XDG_CONFIG_HOME/ace-server/config.toml` (or the platform equivalent)
//! 5. Default values

mod error;
mod file_config;
mod loader;

pub use error::ConfigError;
pub use file_config::{
    FileConfig, FileHistoryConfig, FileLlmConfig, FileLoggingConfig, FileServerConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
