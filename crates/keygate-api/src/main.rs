//! # keygate-api: Binary Entry Point
//!
//! Loads settings, connects the stores and serves the gated API until
//! Ctrl-C.

use std::net::SocketAddr;

use keygate_api::config::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = Settings::load().map_err(|e| {
        tracing::error!("Settings failed to load: {e}");
        e
    })?;
    let addr = settings.bind_addr();
    let metrics_enabled = settings.metrics.enabled;

    let mut state = keygate_api::bootstrap::bootstrap(settings).await.map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    if metrics_enabled {
        let handle = keygate_api::middleware::metrics::install_recorder()?;
        state = state.with_metrics(handle);
    }

    let app = keygate_api::app(state);

    tracing::info!("keygate listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("keygate stopped");
    Ok(())
}

/// Structured tracing: JSON lines when `KEYGATE_LOG_FORMAT=json`, human
/// readable otherwise. Filter from `RUST_LOG`, default `info`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("KEYGATE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
