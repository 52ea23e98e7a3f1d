use std::net::SocketAddr;
use std::path::PathBuf;

use smartsafety_server::app_state::AppState;
use smartsafety_server::config::{ConfigError, ServerConfig};
use smartsafety_server::{db, logging, router};
use tokio::net::TcpListener;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "crates/server/res/config.toml";

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    let config_path: PathBuf = std::env::var("SERVER_CONFIG_PATH")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
        .into();

    let config = ServerConfig::load(&config_path).await?;
    logging::init_tracing(&config)?;
    info!(
        mode = ?config.app.mode,
        dialect = ?config.dialect()?,
        config = %config_path.display(),
        "smartsafety-server starting"
    );

    let repo = db::connect_repo(&config, &config_path).await?;
    db::prepare_database(&config, repo.as_ref()).await?;

    let state = AppState::from_config(&config, repo)?;
    if state.device_key_hash.is_none() {
        warn!("auth.device_api_key is empty; device routes will reject every request");
    }

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("invalid http bind: {e}")))?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConfigError::Invalid(format!("http server error: {e}")))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable");
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
    info!("shutdown signal received");
}
