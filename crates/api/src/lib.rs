//! HTTP surface: toggle read/write and the generic blob endpoints.

pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use store::SharedStateStore;
use tokio::net::TcpListener;
use toggle::ToggleController;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ToggleController>,
    /// Same store the controller writes through, used for blobs.
    pub store: Arc<dyn SharedStateStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/toggle",
            get(handlers::get_toggle).post(handlers::post_toggle),
        )
        .route(
            "/storage/{key}",
            get(handlers::get_storage).post(handlers::post_storage),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await
        .context("server error")?;
    Ok(())
}

/// Resolves when `signal` fires. If the listener cannot be installed the
/// server keeps running instead of stopping right after bind.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
