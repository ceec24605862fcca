//! Claude Monitor - live session state from Claude Code conversation logs.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_monitor::config::{ConfigError, ConfigLoader, MonitorConfig};
use claude_monitor::display;
use claude_monitor::server::{AppState, MonitorServer, ServerConfig};
use claude_monitor::store::SessionStore;
use claude_monitor::watcher::WatchEngine;

#[derive(Parser)]
#[command(
    name = "claude-monitor",
    about = "Live session monitor for Claude Code conversation logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Claude home directory to watch (defaults to ~/.claude).
    #[arg(long, global = true, value_name = "DIR")]
    claude_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the log surfaces and serve the API until interrupted.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Reconstruct sessions from the existing logs once and print them.
    Scan {
        /// Print the session list as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<MonitorConfig, ConfigError> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if cli.claude_dir.is_some() {
        config.claude_dir = cli.claude_dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Could not load configuration");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Scan { json } => scan(config, json).await,
    };

    if let Err(error) = result {
        tracing::error!(%error, "Fatal error");
        std::process::exit(1);
    }
}

/// Run the watch engine and the HTTP server until interrupted.
async fn serve(
    config: MonitorConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::new(config.store_config()).into_shared();
    let state = AppState::connected(store.clone()).await;
    let shutdown = CancellationToken::new();

    let engine = WatchEngine::new(config.watch_config(), store, shutdown.clone())?;
    let server_config = ServerConfig {
        host: host.unwrap_or_else(|| config.server.host.clone()),
        port: port.unwrap_or(config.server.port),
        cors_permissive: config.server.cors,
    };
    let server = MonitorServer::new(state, shutdown.clone()).with_config(server_config);

    let mut engine_task = tokio::spawn(engine.run());
    let mut server_task = tokio::spawn(server.run());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Interrupt received, shutting down");
            shutdown.cancel();
            engine_task.await??;
            server_task.await??;
        }
        result = &mut engine_task => {
            shutdown.cancel();
            result??;
            server_task.await??;
        }
        result = &mut server_task => {
            shutdown.cancel();
            result??;
            engine_task.await??;
        }
    }
    Ok(())
}

/// One-shot reconstruction pass over the existing logs.
async fn scan(config: MonitorConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::new(config.store_config()).into_shared();
    let mut engine = WatchEngine::new(
        config.watch_config(),
        store.clone(),
        CancellationToken::new(),
    )?;
    engine.bootstrap().await;

    let store = store.read().await;
    let sessions = store.list_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        display::print_sessions(&sessions, Utc::now());
    }
    Ok(())
}
