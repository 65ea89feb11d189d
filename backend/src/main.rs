use std::process::ExitCode;

use tasks_backend::config::StoreKind;
use tasks_backend::{build_router, store, telemetry, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if config.store_kind == StoreKind::Redis && config.store_url.is_none() {
        tracing::warn!("REDIS_URL is not set; task requests will fail until it is configured");
    }

    let state = AppState::new(store::from_config(&config));
    let app = build_router(state, config.static_dir.as_deref());

    let bind_address = config.bind_address();
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, address = %bind_address, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        store = ?config.store_kind,
        static_dir = ?config.static_dir,
        "server running on http://{bind_address}"
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
