// betis — esports betting API. Entry point.

use tracing_subscriber::EnvFilter;

use betis::app_state::AppState;
use betis::config::Config;
use betis::routes::build_router;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr;
    let state_file = config.state_file.clone();

    let state = AppState::new(config).shared();
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(addr = %bind_addr, "betis listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // Snapshot the store so balances and bets survive a restart.
    // Sessions are deliberately not persisted; a restart logs everyone
    // out and stale tokens fail the liveness check.
    if let Some(path) = state_file {
        if let Err(e) = state.db.save_to_disk(&path) {
            tracing::error!(error = %e, "failed to save state");
        }
    }
    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install CTRL+C handler");
    tracing::info!("shutdown signal received");
}
