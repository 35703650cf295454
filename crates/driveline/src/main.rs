//! Driveline - OneDrive relay behind a Microsoft sign-in.
//!
//! Main entry point for the relay server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use driveline_server::{RelayConfig, Server};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Driveline - OneDrive relay behind a Microsoft sign-in
///
/// Identity settings come from the environment (CLIENT_ID, TENANT_ID,
/// CLIENT_SECRET, REDIRECT_URI), optionally loaded from a .env file.
#[derive(Parser, Debug)]
#[command(name = "driveline")]
#[command(author, version, about)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, env = "DRIVELINE_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Also write JSON logs to a daily-rotated file in this directory
    #[arg(long, env = "DRIVELINE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let _guard = init_tracing(&cli);

    let mut config = RelayConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = cli.port {
        config.server.bind_address.set_port(port);
    }

    tracing::debug!(
        bind = %config.server.bind_address,
        authority = %config.oauth.authority(),
        graph = %config.graph_base_url,
        "Configuration loaded"
    );

    let server = Server::new(config)?;
    server.run_until(shutdown_signal()).await?;

    Ok(())
}

/// Console logging, plus a JSON file layer when `--log-dir` is set.
///
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = if cli.verbose {
        "driveline=debug,driveline_server=debug,driveline_oauth=debug,driveline_drive=debug,tower_http=debug,info"
    } else {
        "driveline=info,driveline_server=info,driveline_oauth=info,driveline_drive=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    match &cli.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "driveline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_filter(EnvFilter::new(
                            "driveline=trace,driveline_server=trace,driveline_oauth=trace,driveline_drive=trace,info",
                        )),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
