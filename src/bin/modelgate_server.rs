//! modelgate HTTP server.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modelgate::config::GatewayConfig;
use modelgate::service::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    let state = AppState::from_config(&config).context("wiring dispatcher")?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(addr = %config.bind, "modelgate listening");

    axum::serve(listener, router(state))
        .await
        .context("serving")?;

    Ok(())
}
