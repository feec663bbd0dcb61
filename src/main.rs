use anyhow::{Context, Result};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use viewsync::{api, config, runtime::Runtime};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewsync=info".into()),
        )
        .init();

    info!("viewsync starting...");

    let config_path =
        std::env::var("VIEWSYNC_CONFIG").unwrap_or_else(|_| "viewsync.toml".to_string());
    let mut config = config::load_config(&config_path)?;
    config.apply_env_overrides();

    let bind = config.api.bind.clone();
    let runtime = Arc::new(Runtime::new(config)?);

    let app = api::create_router(runtime).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %bind, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("viewsync stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
