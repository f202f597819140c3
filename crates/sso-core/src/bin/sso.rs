//! SSO server
//!
//! Loads configuration, sets up logging, opens storage and serves the auth
//! RPC endpoints until Ctrl-C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use sso_core::{api, logging, SsoConfig};

#[derive(Debug, Parser)]
#[command(name = "sso", version, about = "Single sign-on authentication service")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SsoConfig::load(args.config.as_deref()).context("failed to load config")?;
    logging::setup_logging(config.env)?;

    info!(version = env!("CARGO_PKG_VERSION"), config = ?config, "starting application");

    let auth_service = Arc::new(sso_core::init(&config).await?);
    let app = api::create_router(auth_service, config.server.request_timeout());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    info!("Starting RPC server on http://{}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("application stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("stopping application");
}
