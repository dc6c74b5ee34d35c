//! Configuration file loader with multi-source merging

use super::error::ConfigError;
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ace-server";
const PROJECT_FILES: [&str; 2] = ["ace.toml", ".ace.toml"];
const ENV_PREFIX: &str = "ACE_";

/// One place configuration may come from, for `ace-server config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: Option<PathBuf>,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();
        Self::figment(global.as_deref(), project.as_deref(), config_path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Build the merged figment from explicit file locations.
    ///
    /// Missing files contribute nothing. Environment variables are merged last.
    pub fn figment(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project, explicit].into_iter().flatten() {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/ace-server/config.toml if set,
    /// otherwise falls back to the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Every source consulted by [`load`](Self::load), highest priority first.
    pub fn config_sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                path: Some(path.to_path_buf()),
                found: path.exists(),
            });
        }

        match Self::project_config_path() {
            Some(path) => sources.push(ConfigSource {
                label: "Project",
                path: Some(path),
                found: true,
            }),
            None => sources.push(ConfigSource {
                label: "Project",
                path: Some(PathBuf::from(PROJECT_FILES[0])),
                found: false,
            }),
        }

        if let Some(path) = Self::global_config_path() {
            let found = path.exists();
            sources.push(ConfigSource {
                label: "Global",
                path: Some(path),
                found,
            });
        }

        sources.push(ConfigSource {
            label: "Default",
            path: None,
            found: true,
        });
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.history.backend, "sqlite");
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("ace-server"));
    }

    #[test]
    fn test_later_files_override_earlier() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "global.toml",
                r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"

[server]
port = 9000
"#,
            )?;
            jail.create_file(
                "ace.toml",
                r#"
[llm]
model = "qwen3:8b"
"#,
            )?;

            let config: FileConfig = ConfigLoader::figment(
                Some(Path::new("global.toml")),
                Some(Path::new("ace.toml")),
                None,
            )
            .extract()?;

            assert_eq!(config.llm.provider, "openai");
            assert_eq!(config.llm.model, "qwen3:8b");
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[llm]
provider = "ollama"
context_messages = 10
"#,
            )?;
            jail.set_env("ACE_LLM__PROVIDER", "echo");
            jail.set_env("ACE_HISTORY__DISPLAY_LIMIT", "25");

            let config: FileConfig =
                ConfigLoader::figment(None, None, Some(Path::new("custom.toml"))).extract()?;

            assert_eq!(config.llm.provider, "echo");
            assert_eq!(config.llm.context_messages, 10);
            assert_eq!(config.history.display_limit, 25);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ConfigLoader::load(Some(Path::new("/definitely/not/here/ace.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_project_file_discovery() {
        Jail::expect_with(|jail| {
            assert!(ConfigLoader::project_config_path().is_none());
            jail.create_file(".ace.toml", "")?;
            assert_eq!(
                ConfigLoader::project_config_path(),
                Some(PathBuf::from(".ace.toml"))
            );

            let sources = ConfigLoader::config_sources(Some(Path::new("missing.toml")));
            assert_eq!(sources[0].label, "Explicit");
            assert!(!sources[0].found);
            assert_eq!(sources[1].label, "Project");
            assert!(sources[1].found);
            assert_eq!(sources.last().map(|s| s.label), Some("Default"));
            Ok(())
        });
    }
}
