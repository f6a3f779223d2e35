//! Relay server CLI.
//!
//! Serves the chat relay over HTTP and inspects its configuration.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use relay::client::SharedModelClient;
use relay::llms::Ollama;
use relay::transport::StreamTransport;
use relay_server::config::{self, AppConfig, IssueLevel};
use relay_server::{AppState, Result, ServerError, router};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Relay - HTTP front end for a local Ollama model
#[derive(Parser)]
#[command(name = "relay-server")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "RELAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve(ServeArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Args, Default)]
struct ServeArgs {
    /// Address to listen on (overrides config)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Streaming transport: incremental or buffered (overrides config)
    #[arg(short, long)]
    transport: Option<StreamTransport>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relay_server={level},relay={level},tower_http={},{}",
            if verbosity >= 1 { "debug" } else { "info" },
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => cmd_serve(args, cli.config).await,
        Commands::Config(args) => cmd_config(args, cli.config).await,
    }
}

/// Load the file config and apply environment overrides.
async fn effective_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let path = path.unwrap_or_else(config::config_path);
    Ok(config::load_config_from(&path).await?.with_env())
}

/// Start the HTTP server.
async fn cmd_serve(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = effective_config(config_path).await?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(model) = args.model {
        config.ollama.model = model;
    }
    if let Some(transport) = args.transport {
        config.relay.stream_transport = transport;
    }

    let issues = config.validate();
    for issue in &issues {
        match issue.level {
            IssueLevel::Error => tracing::error!("{issue}"),
            IssueLevel::Warning => tracing::warn!("{issue}"),
        }
    }
    if !config.is_valid() {
        let errors = issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count();
        return Err(ServerError::InvalidConfig(format!(
            "{errors} error(s), see log above"
        )));
    }

    let client: SharedModelClient = Arc::new(Ollama::new(config.ollama.clone())?);
    let state = AppState::new(client)
        .transport(config.relay.stream_transport)
        .channel_capacity(config.relay.channel_capacity);

    let addr = config.server.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(
        %addr,
        model = %config.ollama.model,
        upstream = %config.ollama.base_url,
        transport = %config.relay.stream_transport,
        "relay server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("relay server stopped");
    Ok(())
}

/// Resolve once Ctrl+C is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutting down..."),
        Err(e) => {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.clone().unwrap_or_else(config::config_path);

    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let config = effective_config(config_path).await?;
            println!("{}", config::to_toml(&config)?);
        }
        ConfigCommands::Validate => {
            let config = effective_config(config_path).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if !config.is_valid() {
                return Err(ServerError::InvalidConfig(config_file.display().to_string()));
            }
        }
    }

    Ok(())
}
