use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fieldboard_core::Config;
use fieldboard_server::{router, AppState, TaskStore};

/// Task board HTTP API
#[derive(Parser, Debug)]
#[command(name = "fieldboard-server", version, about)]
struct Cli {
    /// Address to bind (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fieldboard_core::init()?;

    let cli = Cli::parse();
    let (config, _) = Config::load_validated()?;

    let bind = cli.bind.unwrap_or(config.server.bind_address);
    let db_path = cli
        .db
        .unwrap_or_else(|| PathBuf::from(config.server.database_path));

    let store = TaskStore::open(&db_path)
        .with_context(|| format!("Failed to open task store at {}", db_path.display()))?;
    let state = AppState::new(store);

    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("listening on http://{addr}");
    info!("database: {}", db_path.display());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    Ok(())
}
