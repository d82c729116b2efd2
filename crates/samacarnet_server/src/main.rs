//! `samacarnet-server` entry point.
//!
//! Startup order: configuration, logging, database, listener.

use log::{error, info};
use samacarnet_core::db::open_db;
use samacarnet_core::{init_logging, init_stderr_logging};
use samacarnet_server::{build_router, AppState, ServerConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("samacarnet-server: {err}");
            return ExitCode::FAILURE;
        }
    };

    let logging = match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, &dir.to_string_lossy()),
        None => init_stderr_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("samacarnet-server: logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_run module=server status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(&config.db_path)?;
    let app = build_router(AppState::new(conn, config.token_ttl_ms()));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "event=server_run module=server status=start bind={}",
        config.bind
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_run module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=server status=error error={err}");
    }
}
