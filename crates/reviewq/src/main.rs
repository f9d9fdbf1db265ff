mod app;
mod config;
mod connection;
mod handlers;
mod lifecycle;
mod state;
mod storage;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use listenfd::ListenFd;
use serde_json::Value;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::create_app, config::Config, state::AppState};

/// ReviewQ - Human review queue for AI-generated outputs
#[derive(Parser, Debug)]
#[command(name = "reviewq")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST", global = true)]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT", global = true)]
    port: u16,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Seed the pending queue from a JSON array before serving
        #[arg(long)]
        seed_file: Option<PathBuf>,
    },
    /// Replace the pending queue and its backup snapshot, then exit
    Seed {
        /// JSON file holding an array of review items
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reviewq=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;

    let state = AppState::new(config);

    match cli.command {
        Some(Command::Seed { file }) => {
            ensure_persistent_backend(!cfg!(feature = "inmemory"))?;
            seed_from_file(&state, &file).await
        }
        Some(Command::Serve { seed_file }) => {
            if let Some(file) = seed_file {
                seed_from_file(&state, &file).await?;
            }
            serve(state, &cli.host, cli.port).await
        }
        None => serve(state, &cli.host, cli.port).await,
    }
}

/// A standalone seed only makes sense when the data outlives the process.
fn ensure_persistent_backend(persistent: bool) -> Result<()> {
    if !persistent {
        bail!(
            "the in-memory backend does not keep data after `seed` exits; \
             use `reviewq serve --seed-file <path>` instead"
        );
    }
    Ok(())
}

/// Load a JSON array of review items and seed Pending and Backup with it.
async fn seed_from_file(state: &AppState, path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let documents: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("seed file {} is not a JSON array", path.display()))?;

    let summary = lifecycle::seed(&state.connections, documents).await?;
    tracing::info!(
        seeded = summary.seeded,
        replaced = summary.replaced,
        file = %path.display(),
        "Seed complete"
    );
    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    // Build the application router
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{host}:{port}");
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
