//! CLI entrypoint for ace-server
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use ace_application::{HistoryStore, ModelAdapter, SessionOrchestrator};
use ace_domain::{HistoryBackend, Message};
use ace_infrastructure::{
    ConfigLoader, FileConfig, InMemoryHistoryStore, JsonlConversationLogger, ModelRouter,
    SqliteHistoryStore,
};
use ace_presentation::{Cli, Command, ConnectionManager, ConsoleFormatter, OutputFormat, Server};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_tracing(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting ace-server");

    let command = cli.command();
    if command == Command::Config {
        print_config(&cli, &config)?;
        return Ok(());
    }

    let issues = config.validate();
    if !issues.is_empty() {
        eprintln!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Invalid configuration; fix the errors above and try again");
    }

    // === Dependency Injection ===
    let llm_config = config.llm.to_llm_config()?;
    let router = Arc::new(ModelRouter::select(&llm_config)?);

    if let Command::Ask { prompt } = &command {
        let reply = router.complete(&[Message::user(prompt.as_str())]).await?;
        println!("{}", reply);
        return Ok(());
    }

    let backend = config
        .history
        .parse_backend()
        .0
        .ok_or_else(|| anyhow!("Unknown history backend '{}'", config.history.backend))?;
    ensure_history_readable(backend, &command)?;

    let history = open_history(backend, &config)?;
    let mut orchestrator = SessionOrchestrator::new(
        router.clone(),
        Arc::clone(&history),
        config.session_params(),
    );
    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::open(path) {
            Ok(logger) => {
                info!("Conversation log: {}", logger.path().display());
                orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
            }
            Err(e) => warn!("Could not open conversation log {}: {}", path.display(), e),
        }
    }
    let orchestrator = Arc::new(orchestrator);

    match command {
        Command::History {
            session,
            limit,
            output,
        } => {
            let limit = limit.unwrap_or(orchestrator.params().display_limit);
            let messages = orchestrator.get_recent_history(&session, limit).await?;
            let rendered = match output {
                OutputFormat::Text => ConsoleFormatter::format_history(&messages),
                OutputFormat::Json => ConsoleFormatter::format_history_json(&messages),
            };
            println!("{}", rendered);
        }
        Command::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let manager = Arc::new(ConnectionManager::new(orchestrator));
            let address = server_config.bind_address();
            let server = Server::bind(address.as_str(), manager)
                .await
                .with_context(|| format!("Failed to bind {}", address))?;
            info!("Model {}, {} history", router.name(), history.describe());

            let shutdown = CancellationToken::new();
            let on_signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received");
                    on_signal.cancel();
                }
            });

            server.run(shutdown).await?;
        }
        Command::Ask { .. } | Command::Config => {}
    }

    Ok(())
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("logging.file must name a file: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

/// `history` reads a previous run's transcript, which only sqlite keeps.
fn ensure_history_readable(backend: HistoryBackend, command: &Command) -> Result<()> {
    if backend == HistoryBackend::Memory && matches!(command, Command::History { .. }) {
        bail!(
            "The memory history backend keeps nothing between runs; \
             set history.backend = \"sqlite\" to read past conversations"
        );
    }
    Ok(())
}

fn open_history(backend: HistoryBackend, config: &FileConfig) -> Result<Arc<dyn HistoryStore>> {
    let store: Arc<dyn HistoryStore> = match backend {
        HistoryBackend::Memory => Arc::new(InMemoryHistoryStore::new()),
        HistoryBackend::Sqlite => {
            Arc::new(SqliteHistoryStore::open_in_data_dir(&config.server.data_dir)?)
        }
    };
    Ok(store)
}

fn print_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    println!("Configuration sources (in priority order):");
    println!("  [ENV  ] ACE_* environment variables");
    if cli.no_config {
        println!("  (config files disabled by --no-config)");
    } else {
        for source in ConfigLoader::config_sources(cli.config.as_deref()) {
            let marker = if source.found { "FOUND" } else { "     " };
            match source.path {
                Some(path) => println!("  [{}] {:<8} {}", marker, source.label, path.display()),
                None => println!("  [{}] {:<8} built-in defaults", marker, source.label),
            }
        }
    }

    println!();
    println!("Effective configuration:");
    println!("{}", config.to_redacted_toml()?);

    let issues = config.validate();
    if !issues.is_empty() {
        println!("{}", ConsoleFormatter::format_issues(&issues));
    }
    Ok(())
}
