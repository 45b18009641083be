use std::{future::Future, sync::Arc};

pub mod core {
    pub mod app_state;
}
pub mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::{
    core::app_state::{AppConfig, AppState},
    error_handler::AppError,
    routes::{create_branch_mr::create_branch_mr_route::create_branch_mr, ping_route::ping},
};

/// Builds the HTTP router over shared state. Any origin may call it.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create-branch-mr/", post(create_branch_mr))
        .route("/create-branch-mr", post(create_branch_mr))
        .route("/ping", get(ping))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Loads configuration from the environment, binds `API_ADDRESS` and serves
/// until Ctrl+C.
///
/// # Errors
/// Configuration problems are reported before the listener is bound.
pub async fn start() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    let state = Arc::new(AppState::from_config(&cfg)?);

    let listener = TcpListener::bind(&cfg.api_address)
        .await
        .map_err(AppError::Bind)?;

    serve(listener, state, shutdown_signal()).await
}

/// Serves the router on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "api listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(AppError::Server)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
