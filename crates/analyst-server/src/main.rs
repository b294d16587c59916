//! Fundamentals HTTP server.

use anyhow::Context;
use analyst_server::{AppConfig, AppState, import_symbols, router};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(?config, "Starting fundamentals server");

    let state = AppState::from_config(&config).context("failed to initialize services")?;

    if let Some(path) = &config.symbols_path {
        if let Err(e) = import_symbols(state.symbols.as_ref(), path).await {
            warn!(path = %path.display(), error = %e, "Symbol import failed, search may be incomplete");
        }
    }

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "Listening");

    axum::serve(listener, router(state)).await.context("server error")?;
    Ok(())
}
