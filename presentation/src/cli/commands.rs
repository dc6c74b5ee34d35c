//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for `history`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable transcript
    #[default]
    Text,
    /// One JSON array of `{role, content}` objects
    Json,
}

/// CLI arguments for ace-server
#[derive(Parser, Debug)]
#[command(name = "ace-server")]
#[command(author, version, about = "WebSocket coordination server for streaming LLM conversations")]
#[command(long_about = r#"
ace-server accepts WebSocket clients on /ws, stores each user message in a
conversation history, and streams the configured model's reply back
fragment by fragment.

Configuration is merged from (highest priority first):
1. ACE_* environment variables    e.g. ACE_LLM__MODEL=qwen3:8b
2. --config <path>                Explicit config file
3. ./ace.toml or ./.ace.toml      Project-level config
4. ~/.config/ace-server/config.toml   Global config

Example:
  ace-server                      Start the server with the merged config
  ace-server serve --port 9000
  ace-server history --limit 20
  ace-server ask "Say hello"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the WebSocket server (default)
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the most recent conversation history
    History {
        /// Session identifier (ignored by the sqlite backend)
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Number of messages to show (defaults to history.display_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Send one prompt to the configured model and print the full reply
    Ask {
        /// The prompt text
        prompt: String,
    },

    /// Show configuration sources and the effective configuration
    Config,
}

impl Default for Command {
    fn default() -> Self {
        Self::Serve {
            host: None,
            port: None,
        }
    }
}
